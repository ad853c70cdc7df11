//! Dispatch of LSP messages onto the document store.

use crate::arena_pool::with_pooled_arena;
use crate::core::DocumentStore;
use crate::protocol::LspConnection;
use anyhow::Result;
use lsp_server::{Notification, Request, RequestId, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument,
    PublishDiagnostics,
};
use lsp_types::request::Completion;
use lsp_types::{CompletionItem, CompletionResponse, PublishDiagnosticsParams};
use serde::{de::DeserializeOwned, Serialize};

/// Routes document lifecycle notifications and queries to the store.
///
/// Mutating notifications (open/change/save/close) require `&mut` access to
/// the store; the store assumes this handler is its only driver.
pub struct MessageHandler;

impl MessageHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle LSP notifications (document lifecycle events)
    pub fn handle_notification<C: LspConnection>(
        &self,
        connection: &C,
        not: Notification,
        store: &mut DocumentStore,
    ) -> Result<()> {
        let not = match Self::cast_notification::<DidOpenTextDocument>(not) {
            Ok(params) => {
                let uri = params.text_document.uri;
                if let Err(err) = store.open_document(&uri, &params.text_document.text) {
                    tracing::error!(uri = uri.as_str(), error = %err, "open failed");
                }
                return Ok(());
            }
            Err(not) => not,
        };

        let not = match Self::cast_notification::<DidChangeTextDocument>(not) {
            Ok(mut params) => {
                // Full-document sync: the last change carries the new text.
                if let Some(change) = params.content_changes.pop() {
                    let uri = params.text_document.uri;
                    if let Err(err) = store.refresh_document(&uri, change.text) {
                        tracing::error!(uri = uri.as_str(), error = %err, "refresh failed");
                    }
                }
                return Ok(());
            }
            Err(not) => not,
        };

        let not = match Self::cast_notification::<DidSaveTextDocument>(not) {
            Ok(params) => {
                store.apply_save(&params.text_document.uri);
                return Ok(());
            }
            Err(not) => not,
        };

        match Self::cast_notification::<DidCloseTextDocument>(not) {
            Ok(params) => {
                let uri = params.text_document.uri;
                store.close_document(&uri);
                // Clear diagnostics on close
                Self::send_notification::<PublishDiagnostics>(
                    connection,
                    PublishDiagnosticsParams {
                        uri,
                        diagnostics: vec![],
                        version: None,
                    },
                )?;
            }
            Err(_not) => {
                // Unknown notification, ignore
            }
        };

        Ok(())
    }

    /// Handle LSP requests. Unrecognized methods fall through silently.
    pub fn handle_request<C: LspConnection>(
        &self,
        connection: &C,
        req: Request,
        store: &DocumentStore,
    ) -> Result<()> {
        match Self::cast_request::<Completion>(req) {
            Ok((id, params)) => {
                let uri = &params.text_document_position.text_document.uri;
                let result = store.get_handle(uri).map(|handle| {
                    with_pooled_arena(|arena| {
                        let mut items: Vec<CompletionItem> = store
                            .error_completion_items(arena, handle)
                            .iter()
                            .map(|&item| item.clone())
                            .collect();
                        items.extend(
                            store
                                .enum_completion_items(arena, handle)
                                .iter()
                                .map(|&item| item.clone()),
                        );
                        CompletionResponse::Array(items)
                    })
                });

                connection.send_response(Response::new_ok(id, result))?;
                Ok(())
            }
            Err(_req) => Ok(()),
        }
    }

    /// Try a notification against method `N`. A method mismatch hands the
    /// notification back for the next candidate; undecodable params are
    /// logged and replaced with an inert one nothing will match.
    fn cast_notification<N>(not: Notification) -> std::result::Result<N::Params, Notification>
    where
        N: lsp_types::notification::Notification,
        N::Params: DeserializeOwned,
    {
        not.extract(N::METHOD).map_err(|err| match err {
            lsp_server::ExtractError::MethodMismatch(not) => not,
            lsp_server::ExtractError::JsonError { method, error } => {
                tracing::warn!(method = %method, error = %error, "undecodable notification params");
                Notification::new(method, serde_json::Value::Null)
            }
        })
    }

    /// Request counterpart of [`Self::cast_notification`].
    fn cast_request<R>(req: Request) -> std::result::Result<(RequestId, R::Params), Request>
    where
        R: lsp_types::request::Request,
        R::Params: DeserializeOwned,
    {
        req.extract(R::METHOD).map_err(|err| match err {
            lsp_server::ExtractError::MethodMismatch(req) => req,
            lsp_server::ExtractError::JsonError { method, error } => {
                tracing::warn!(method = %method, error = %error, "undecodable request params");
                Request {
                    id: RequestId::from(0),
                    method,
                    params: serde_json::Value::Null,
                }
            }
        })
    }

    fn send_notification<N>(connection: &impl LspConnection, params: N::Params) -> Result<()>
    where
        N: lsp_types::notification::Notification,
        N::Params: Serialize,
    {
        connection.send_notification(Notification::new(N::METHOD.to_owned(), params))
    }
}

impl Default for MessageHandler {
    fn default() -> Self {
        Self::new()
    }
}
