//! Application state and the send pipeline.
//!
//! `ChatApp` is the single owner of all conversation state: the chat
//! collection, the current-chat pointer, the session token, and the busy
//! gate. One send runs at a time. Every outcome of a send (reply, protocol
//! error, transport error) lands in the conversation as an assistant
//! message, and the gate returns to Idle on all paths.

use std::sync::Arc;

use crate::error::StorageResult;
use crate::gate::SendGate;
use crate::session::{ChatManager, MessageSender};
use crate::webhook::ReplyEndpoint;

/// Result of a send trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The endpoint replied; the reply text was appended.
    Delivered { reply: String },
    /// The request failed; the error text was appended.
    Failed { error: String },
    /// A send was already in flight; nothing was appended or dispatched.
    Busy,
    /// The trimmed input was empty; nothing was appended or dispatched.
    EmptyInput,
}

/// Owns the conversation state and coordinates the single-flight send.
pub struct ChatApp {
    manager: ChatManager,
    endpoint: Arc<dyn ReplyEndpoint>,
    gate: SendGate,
}

impl ChatApp {
    pub fn new(manager: ChatManager, endpoint: Arc<dyn ReplyEndpoint>) -> Self {
        Self {
            manager,
            endpoint,
            gate: SendGate::new(),
        }
    }

    /// Read access to the conversation state.
    pub fn manager(&self) -> &ChatManager {
        &self.manager
    }

    /// Mutable access for chat lifecycle operations (`start_new_chat`,
    /// `select_chat`, `current_chat`).
    pub fn manager_mut(&mut self) -> &mut ChatManager {
        &mut self.manager
    }

    /// Sends one user message through the webhook.
    ///
    /// While a send is in flight, further triggers return
    /// [`SendOutcome::Busy`] without touching conversation state, so the
    /// caller can tell the user instead of dropping the input silently.
    /// Request failures are converted to assistant-authored error messages
    /// here and are never propagated.
    ///
    /// # Errors
    ///
    /// Only local persistence failures surface as errors.
    pub async fn send_message(&mut self, text: &str) -> StorageResult<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::EmptyInput);
        }

        let Some(_permit) = self.gate.acquire() else {
            tracing::debug!("send rejected: a request is already in flight");
            return Ok(SendOutcome::Busy);
        };

        self.manager.append_message(MessageSender::User, text)?;

        let session_id = self.manager.session_id().to_string();
        let outcome = match self.endpoint.request_reply(text, &session_id).await {
            Ok(reply) => {
                self.manager
                    .append_message(MessageSender::Assistant, reply.clone())?;
                SendOutcome::Delivered { reply }
            }
            Err(err) => {
                tracing::error!(error = %err, "webhook request failed");
                let error = format!("Error: {err}. Please try again.");
                self.manager
                    .append_message(MessageSender::Assistant, error.clone())?;
                SendOutcome::Failed { error }
            }
        };

        // _permit drops here, restoring Idle.
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_storage::ChatStorage;
    use crate::identity::IdentityStore;
    use crate::session::ChatMessage;
    use crate::webhook::WebhookError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Scripted endpoint that counts outbound calls.
    struct MockEndpoint {
        reply: Result<String, WebhookError>,
        calls: AtomicUsize,
    }

    impl MockEndpoint {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: WebhookError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReplyEndpoint for MockEndpoint {
        async fn request_reply(
            &self,
            _message: &str,
            _session_id: &str,
        ) -> Result<String, WebhookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(WebhookError::Status { status, reason }) => Err(WebhookError::Status {
                    status: *status,
                    reason: reason.clone(),
                }),
                Err(WebhookError::MalformedReply { message }) => {
                    Err(WebhookError::MalformedReply {
                        message: message.clone(),
                    })
                }
                Err(WebhookError::Request { .. }) => {
                    unreachable!("transport errors are not scripted in these tests")
                }
            }
        }
    }

    fn open_app(dir: &TempDir, endpoint: Arc<dyn ReplyEndpoint>) -> ChatApp {
        let storage = ChatStorage::new(dir.path()).unwrap();
        let identity = IdentityStore::new(dir.path()).unwrap();
        let manager = ChatManager::open(storage, identity).unwrap();
        ChatApp::new(manager, endpoint)
    }

    fn messages(app: &mut ChatApp) -> Vec<ChatMessage> {
        app.manager_mut().current_chat().messages.clone()
    }

    #[tokio::test]
    async fn test_successful_send_appends_user_then_reply() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = MockEndpoint::replying("Hi!");
        let mut app = open_app(&temp_dir, endpoint.clone());

        let outcome = app.send_message("Hello").await.unwrap();

        assert_eq!(
            outcome,
            SendOutcome::Delivered {
                reply: "Hi!".to_string()
            }
        );
        assert_eq!(endpoint.calls(), 1);

        let messages = messages(&mut app);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, MessageSender::User);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].sender, MessageSender::Assistant);
        assert_eq!(messages[1].text, "Hi!");
    }

    #[tokio::test]
    async fn test_status_failure_becomes_error_message() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = MockEndpoint::failing(WebhookError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
        });
        let mut app = open_app(&temp_dir, endpoint.clone());

        let outcome = app.send_message("Hello").await.unwrap();

        let SendOutcome::Failed { error } = outcome else {
            panic!("expected a failed outcome");
        };
        assert_eq!(
            error,
            "Error: Error 500: Internal Server Error. Please try again."
        );

        let messages = messages(&mut app);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, MessageSender::Assistant);
        assert!(messages[1].text.starts_with("Error: Error 500"));

        // Sending is re-enabled after settlement.
        assert!(app.gate.acquire().is_some());
    }

    #[tokio::test]
    async fn test_busy_gate_rejects_without_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = MockEndpoint::replying("never sent");
        let mut app = open_app(&temp_dir, endpoint.clone());

        // Hold the permit as if a send were in flight.
        let _in_flight = app.gate.acquire().unwrap();

        let outcome = app.send_message("Hello").await.unwrap();

        assert_eq!(outcome, SendOutcome::Busy);
        assert_eq!(endpoint.calls(), 0);
        assert!(messages(&mut app).is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_is_not_dispatched() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = MockEndpoint::replying("never sent");
        let mut app = open_app(&temp_dir, endpoint.clone());

        let outcome = app.send_message("   ").await.unwrap();

        assert_eq!(outcome, SendOutcome::EmptyInput);
        assert_eq!(endpoint.calls(), 0);
        assert!(messages(&mut app).is_empty());
    }

    #[tokio::test]
    async fn test_first_send_freezes_title() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = MockEndpoint::replying("Hi!");
        let mut app = open_app(&temp_dir, endpoint);

        app.send_message("Hello there, how are you today please")
            .await
            .unwrap();

        assert_eq!(
            app.manager_mut().current_chat().title,
            "Hello there, how are you today..."
        );
    }

    #[tokio::test]
    async fn test_send_uses_current_session_token() {
        struct CapturingEndpoint {
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl ReplyEndpoint for CapturingEndpoint {
            async fn request_reply(
                &self,
                _message: &str,
                session_id: &str,
            ) -> Result<String, WebhookError> {
                self.seen.lock().unwrap().push(session_id.to_string());
                Ok("ok".to_string())
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let endpoint = Arc::new(CapturingEndpoint {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let mut app = open_app(&temp_dir, endpoint.clone());

        app.send_message("first").await.unwrap();
        app.manager_mut().start_new_chat().unwrap();
        app.send_message("second").await.unwrap();

        let seen = endpoint.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        // A new chat rotates the token the requests carry.
        assert_ne!(seen[0], seen[1]);
    }
}
