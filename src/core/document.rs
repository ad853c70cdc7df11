//! The per-document handle.

use crate::analysis::{DocumentScope, NodeIndex, Tree};
use crate::core::hash::ContentHash;
use lsp_types::Uri;

/// One `@cImport` directive of a document: the syntax node that produced it,
/// the content hash of the rendered C source, and the source itself.
#[derive(Debug, Clone)]
pub struct CimportEntry {
    pub node: NodeIndex,
    pub hash: ContentHash,
    pub source: String,
}

/// Store-owned record for one source document.
///
/// Handles are born when a document is opened or materialized as a
/// dependency, mutated only by refresh and save, and die only in garbage
/// collection. References to other handles are URIs, never pointers; all
/// traversal goes through the store's lookup (imports can form cycles).
pub struct Handle {
    /// Unique identity; equals the key this handle is stored under.
    pub uri: Uri,
    /// Source text. Immutable once installed; refresh replaces it wholesale.
    pub text: String,
    /// Parsed directive tree over `text`.
    pub tree: Tree,
    /// Derived semantic index (completion sets).
    pub document_scope: DocumentScope,
    /// True iff the editor currently has this document open.
    pub open: bool,
    /// Resolved dependency URIs, one per import directive that resolved.
    pub import_uris: Vec<Uri>,
    /// One entry per `@cImport` directive that rendered to C source.
    pub cimports: Vec<CimportEntry>,
    /// The build file governing this document, when one was found.
    pub associated_build_file: Option<Uri>,
    /// True iff this document is itself a build file.
    pub is_build_file: bool,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("uri", &self.uri.as_str())
            .field(
                "text",
                &format!("{}...", &self.text.chars().take(50).collect::<String>()),
            )
            .field("open", &self.open)
            .field("imports", &self.import_uris.len())
            .field("cimports", &self.cimports.len())
            .field(
                "associated_build_file",
                &self.associated_build_file.as_ref().map(|u| u.as_str()),
            )
            .field("is_build_file", &self.is_build_file)
            .finish()
    }
}
