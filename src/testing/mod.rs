//! Test support: mock collaborators.

pub mod mocks;

pub use mocks::{MockTranslator, TRANSLATED_CONTENTS};
