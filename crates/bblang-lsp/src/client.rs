//! Messages from the server to the editor.

use bblang_core::FileUri;
use crossbeam_channel::Sender;
use lsp_types::notification::{Notification, PublishDiagnostics, ShowMessage};
use lsp_types::{MessageType, PublishDiagnosticsParams, ShowMessageParams};

use crate::handlers::utils::to_lsp_uri;

/// Outgoing half of the connection. Cheap to clone and usable from any
/// thread.
#[derive(Debug, Clone)]
pub struct Client {
    sender: Sender<lsp_server::Message>,
}

impl Client {
    /// Wrap the connection's sender.
    pub const fn new(sender: Sender<lsp_server::Message>) -> Self {
        Self { sender }
    }

    /// Send a message to the client.
    pub fn send(&self, message: lsp_server::Message) {
        if let Err(e) = self.sender.send(message) {
            tracing::error!("Failed to send message: {}", e);
        }
    }

    /// Answer a request.
    pub fn respond(&self, response: lsp_server::Response) {
        self.send(lsp_server::Message::Response(response));
    }

    /// Send a notification.
    pub fn notify<N: Notification>(&self, params: N::Params) {
        let notification = lsp_server::Notification::new(N::METHOD.to_string(), params);
        self.send(lsp_server::Message::Notification(notification));
    }

    /// Replace the diagnostics shown for `uri`.
    pub fn publish_diagnostics(
        &self,
        uri: &FileUri,
        diagnostics: Vec<lsp_types::Diagnostic>,
        version: Option<i32>,
    ) {
        let Some(lsp_uri) = to_lsp_uri(uri) else {
            return;
        };
        tracing::debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
        self.notify::<PublishDiagnostics>(PublishDiagnosticsParams {
            uri: lsp_uri,
            diagnostics,
            version,
        });
    }

    /// Show a message in the editor.
    pub fn show_message(&self, typ: MessageType, message: impl Into<String>) {
        self.notify::<ShowMessage>(ShowMessageParams {
            typ,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_diagnostics_notification() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let client = Client::new(sender);
        client.publish_diagnostics(&FileUri::new("file:///a.bbc"), Vec::new(), Some(4));

        let lsp_server::Message::Notification(notification) = receiver.try_recv().unwrap() else {
            panic!("expected a notification");
        };
        assert_eq!(notification.method, PublishDiagnostics::METHOD);
        let params: PublishDiagnosticsParams = serde_json::from_value(notification.params).unwrap();
        assert_eq!(params.version, Some(4));
        assert!(params.diagnostics.is_empty());
    }

    #[test]
    fn test_send_after_disconnect_does_not_panic() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        drop(receiver);
        Client::new(sender).show_message(MessageType::ERROR, "gone");
    }
}
