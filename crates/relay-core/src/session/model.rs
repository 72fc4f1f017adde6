//! Chat domain model.
//!
//! This module contains the core `Chat` entity: one conversation thread
//! with its ordered message history and display title.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{ChatMessage, MessageSender};

/// Title used for chats that have not received a user message yet.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum number of characters kept when deriving a title from the first
/// user message.
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended to a derived title that was truncated.
const TITLE_ELLIPSIS: &str = "...";

/// One conversation thread.
///
/// A chat contains:
/// - A unique, immutable identifier
/// - A display title, frozen once derived from the first user message
/// - The ordered, append-only message history
/// - A creation timestamp
///
/// Field names follow the persisted wire format, so a saved collection reads
/// as `[{"id", "title", "messages", "createdAt"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Unique chat identifier (UUID format).
    pub id: String,
    /// Human-readable chat title.
    pub title: String,
    /// Conversation history, in insertion order.
    pub messages: Vec<ChatMessage>,
    /// Timestamp when the chat was created (ISO 8601 format).
    pub created_at: String,
}

impl Chat {
    /// Creates a new empty chat with a fresh id and the default title.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Appends a message, freezing the title if this is the first user
    /// message of the chat.
    ///
    /// The history is append-only: messages are never edited or removed,
    /// and insertion order is display order.
    pub fn push_message(&mut self, sender: MessageSender, text: impl Into<String>) {
        let text = text.into();

        if self.messages.is_empty() && sender == MessageSender::User {
            self.title = derive_title(&text);
        }

        self.messages.push(ChatMessage::now(sender, text));
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a chat title from the first user message.
///
/// The text is truncated to [`TITLE_MAX_CHARS`] characters (not bytes, so
/// multi-byte input never splits a character) with `...` appended when
/// truncation occurred.
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let truncated: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();

    if chars.next().is_some() {
        format!("{truncated}{TITLE_ELLIPSIS}")
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_has_default_title_and_no_messages() {
        let chat = Chat::new();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
        assert!(chat.messages.is_empty());
        assert!(!chat.id.is_empty());
    }

    #[test]
    fn test_derive_title_short_text_unchanged() {
        assert_eq!(derive_title("Hello"), "Hello");
    }

    #[test]
    fn test_derive_title_truncates_at_thirty_chars() {
        // 38 characters in, first 30 out plus the marker.
        let text = "Hello there, how are you today please";
        assert_eq!(derive_title(text), "Hello there, how are you today...");
    }

    #[test]
    fn test_derive_title_counts_chars_not_bytes() {
        let text = "んんんんんんんんんんんんんんんんんんんんんんんんんんんんんんX";
        let title = derive_title(text);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + TITLE_ELLIPSIS.len());
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_title_frozen_after_first_user_message() {
        let mut chat = Chat::new();
        chat.push_message(MessageSender::User, "First question");
        assert_eq!(chat.title, "First question");

        chat.push_message(MessageSender::Assistant, "An answer");
        chat.push_message(MessageSender::User, "A different follow-up");
        assert_eq!(chat.title, "First question");
    }

    #[test]
    fn test_leading_assistant_message_does_not_set_title() {
        let mut chat = Chat::new();
        chat.push_message(MessageSender::Assistant, "Unprompted greeting");
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);

        // The title stays at the default; only a first *user* message may
        // claim it, and here the first slot is already taken.
        chat.push_message(MessageSender::User, "Actual question");
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
    }

    #[test]
    fn test_messages_keep_insertion_order() {
        let mut chat = Chat::new();
        for index in 0..5 {
            chat.push_message(MessageSender::User, format!("message {index}"));
        }

        let texts: Vec<_> = chat.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            ["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[test]
    fn test_wire_format_field_names() {
        let chat = Chat {
            id: "abc".to_string(),
            title: "T".to_string(),
            messages: vec![],
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_value(&chat).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
