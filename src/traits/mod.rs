//! Collaborator interfaces for the document store.
//!
//! These traits keep the store decoupled from the sub-process machinery so
//! tests can inject deterministic implementations.

use lsp_types::Uri;
use std::fmt;
use std::path::PathBuf;

/// Outcome of translating one rendered C source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Translation produced a Zig source file at this URI.
    Success(Uri),
    /// The translator rejected the source. The failure arm carries no
    /// payload today but participates in normal ownership so diagnostics can
    /// be attached later without changing callers.
    Failure,
}

/// Trait for translating rendered C source into Zig source on disk.
pub trait CTranslator: Send + Sync + fmt::Debug {
    /// Translate `c_source` using the given include directories.
    ///
    /// `None` signals a transient failure (spawn error, I/O); the outcome is
    /// not cached and a later call may retry. `Some(Translation::Failure)`
    /// is cached: the source itself does not translate.
    fn translate(&self, c_source: &str, include_dirs: &[PathBuf]) -> Option<Translation>;
}
