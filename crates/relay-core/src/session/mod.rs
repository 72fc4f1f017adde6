//! Session domain module.
//!
//! This module contains the chat-related domain models and lifecycle
//! management.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageSender`, `ChatMessage`)
//! - `model`: Core chat domain model (`Chat`)
//! - `manager`: Chat lifecycle management (`ChatManager`)

mod manager;
mod message;
mod model;

// Re-export public API
pub use manager::ChatManager;
pub use message::{ChatMessage, MessageSender};
pub use model::{Chat, DEFAULT_CHAT_TITLE, TITLE_MAX_CHARS, derive_title};
