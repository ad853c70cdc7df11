//! Transport seam between the store's driver loop and the editor.

use anyhow::Result;
use lsp_server::{Connection, Message, Notification, Response};

/// Outbound half of the LSP transport.
///
/// The driver loop owns the inbound side and serializes all store mutation;
/// everything the handlers send back out (completion answers, the cleared
/// diagnostics pushed on `didClose`) goes through this trait, so tests can
/// capture the traffic without standing up a stdio transport.
pub trait LspConnection {
    /// Answer a request by id.
    fn send_response(&self, response: Response) -> Result<()>;

    /// Push a server-initiated notification.
    fn send_notification(&self, notification: Notification) -> Result<()>;
}

// The stdio connection is the real transport: outbound messages are fed
// straight into its sender half.
impl LspConnection for Connection {
    fn send_response(&self, response: Response) -> Result<()> {
        Ok(self.sender.send(Message::Response(response))?)
    }

    fn send_notification(&self, notification: Notification) -> Result<()> {
        Ok(self.sender.send(Message::Notification(notification))?)
    }
}
