//! Real collaborator implementations backed by the Zig toolchain.

pub mod translate_c;

pub use translate_c::ZigTranslator;
