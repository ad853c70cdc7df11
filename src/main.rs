use anyhow::Result;
use lsp_server::{Connection, Message};
use lsp_types::{
    CompletionOptions, InitializeParams, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, WorkDoneProgressOptions,
};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zig_lsp::impls::ZigTranslator;
use zig_lsp::{Config, DocumentStore, MessageHandler};

fn main() -> Result<(), Box<dyn Error + Sync + Send>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let (connection, io_threads) = Connection::stdio();

    let server_capabilities = serde_json::to_value(ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".to_string(), ":".to_string(), "@".to_string()]),
            resolve_provider: Some(false),
            work_done_progress_options: WorkDoneProgressOptions::default(),
            ..Default::default()
        }),
        ..Default::default()
    })?;

    let initialization_params = connection.initialize(server_capabilities)?;
    let params: InitializeParams = serde_json::from_value(initialization_params)?;

    main_loop(connection, params)?;

    io_threads.join()?;

    Ok(())
}

fn main_loop(connection: Connection, params: InitializeParams) -> Result<()> {
    let config: Config = params
        .initialization_options
        .and_then(|options| match serde_json::from_value(options) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(error = %err, "malformed initialization options, using defaults");
                None
            }
        })
        .unwrap_or_default();

    tracing::info!(
        zig_exe = ?config.zig_exe_path,
        zig_lib = ?config.zig_lib_path,
        "starting document store"
    );

    let config = Arc::new(config);
    let translator = Arc::new(ZigTranslator::new(Arc::clone(&config)));
    let mut store = DocumentStore::new(config, translator);
    let message_handler = MessageHandler::new();

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    return Ok(());
                }
                message_handler.handle_request(&connection, req, &store)?;
            }
            Message::Notification(not) => {
                message_handler.handle_notification(&connection, not, &mut store)?;
            }
            Message::Response(_resp) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_server::{Notification, RequestId, Response};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use zig_lsp::LspConnection;

    /// Transport stub that only counts outbound traffic.
    #[derive(Clone, Default)]
    struct CountingConnection {
        responses: Arc<AtomicUsize>,
        notifications: Arc<AtomicUsize>,
    }

    impl LspConnection for CountingConnection {
        fn send_response(&self, _response: Response) -> Result<()> {
            self.responses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn send_notification(&self, _notification: Notification) -> Result<()> {
            self.notifications.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_store() -> DocumentStore {
        DocumentStore::new(
            Arc::new(Config::default()),
            Arc::new(zig_lsp::testing::MockTranslator::default()),
        )
    }

    #[test]
    fn test_did_open_notification_creates_handle() {
        let conn = CountingConnection::default();
        let handler = MessageHandler::new();
        let mut store = test_store();

        let params = lsp_types::DidOpenTextDocumentParams {
            text_document: lsp_types::TextDocumentItem {
                uri: "file:///a.zig".parse().unwrap(),
                language_id: "zig".to_string(),
                text: "const x = 1;".to_string(),
                version: 1,
            },
        };
        let not = Notification::new(
            "textDocument/didOpen".to_string(),
            serde_json::to_value(params).unwrap(),
        );
        handler.handle_notification(&conn, not, &mut store).unwrap();
        assert_eq!(store.handle_count(), 1);
    }

    #[test]
    fn test_did_close_clears_diagnostics_and_store() {
        let conn = CountingConnection::default();
        let handler = MessageHandler::new();
        let mut store = test_store();

        let uri: lsp_types::Uri = "file:///a.zig".parse().unwrap();
        store.open_document(&uri, "const x = 1;").unwrap();

        let params = lsp_types::DidCloseTextDocumentParams {
            text_document: lsp_types::TextDocumentIdentifier { uri },
        };
        let not = Notification::new(
            "textDocument/didClose".to_string(),
            serde_json::to_value(params).unwrap(),
        );
        handler.handle_notification(&conn, not, &mut store).unwrap();
        assert_eq!(store.handle_count(), 0);
        assert_eq!(conn.notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completion_request_answers() {
        let conn = CountingConnection::default();
        let handler = MessageHandler::new();
        let mut store = test_store();

        let uri: lsp_types::Uri = "file:///a.zig".parse().unwrap();
        store
            .open_document(&uri, "const E = error{ NotFound };")
            .unwrap();

        let params = lsp_types::CompletionParams {
            text_document_position: lsp_types::TextDocumentPositionParams {
                text_document: lsp_types::TextDocumentIdentifier { uri },
                position: lsp_types::Position::new(0, 0),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        };
        let req = lsp_server::Request {
            id: RequestId::from(1),
            method: "textDocument/completion".to_string(),
            params: serde_json::to_value(params).unwrap(),
        };
        handler.handle_request(&conn, req, &store).unwrap();
        assert_eq!(conn.responses.load(Ordering::SeqCst), 1);
    }
}
