//! Per-document semantic index.

use super::scanner::{NodeKind, Tree};
use lsp_types::{CompletionItem, CompletionItemKind};

/// Completion sets derived from one document's tree.
///
/// Rebuilt wholesale whenever the document text changes. Downstream queries
/// aggregate these across the import graph, so the sets here cover only the
/// declarations of this document itself.
#[derive(Debug, Default)]
pub struct DocumentScope {
    /// One item per declared error tag.
    pub error_completions: Vec<CompletionItem>,
    /// One item per declared enum tag.
    pub enum_completions: Vec<CompletionItem>,
}

impl DocumentScope {
    pub fn build(tree: &Tree) -> Self {
        let mut error_completions = Vec::new();
        let mut enum_completions = Vec::new();

        for (_, node) in tree.nodes() {
            match &node.kind {
                NodeKind::ErrorSet { tags } => {
                    for tag in tags {
                        error_completions.push(completion_item(tag, CompletionItemKind::CONSTANT));
                    }
                }
                NodeKind::EnumDecl { tags } => {
                    for tag in tags {
                        enum_completions.push(completion_item(tag, CompletionItemKind::ENUM_MEMBER));
                    }
                }
                _ => {}
            }
        }

        Self {
            error_completions,
            enum_completions,
        }
    }
}

fn completion_item(label: &str, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        ..Default::default()
    }
}
