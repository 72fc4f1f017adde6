//! Chat collection persistence.
//!
//! `ChatStorage` handles reading and writing the chat collection as a single
//! JSON document in the storage directory:
//!
//! ```text
//! base_dir/
//! ├── chats.json     # array of at most 20 chats
//! └── session_id     # owned by IdentityStore
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageResult;
use crate::session::Chat;

const CHATS_FILE: &str = "chats.json";

/// Number of chats retained on disk. Older entries are evicted first.
pub const MAX_STORED_CHATS: usize = 20;

/// Persists the chat collection to the filesystem.
pub struct ChatStorage {
    base_dir: PathBuf,
}

impl ChatStorage {
    /// Creates a `ChatStorage` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Loads the persisted chat collection.
    ///
    /// A missing file yields an empty collection. Malformed content is
    /// logged and discarded, also yielding an empty collection; parse
    /// failures are never surfaced to the caller.
    pub fn load(&self) -> StorageResult<Vec<Chat>> {
        let path = self.chats_path();

        if !path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)?;

        match serde_json::from_str(&json) {
            Ok(chats) => Ok(chats),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "discarding unreadable chat history"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Saves the chat collection, keeping only the most recent
    /// [`MAX_STORED_CHATS`] entries.
    ///
    /// Must be called after every mutation so a reload never loses
    /// acknowledged state newer than the retention window.
    pub fn save(&self, chats: &[Chat]) -> StorageResult<()> {
        let start = chats.len().saturating_sub(MAX_STORED_CHATS);
        let recent = &chats[start..];

        let json = serde_json::to_string_pretty(recent)?;
        fs::write(self.chats_path(), json)?;

        Ok(())
    }

    fn chats_path(&self) -> PathBuf {
        self.base_dir.join(CHATS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MessageSender;
    use tempfile::TempDir;

    fn chat_with_message(text: &str) -> Chat {
        let mut chat = Chat::new();
        chat.push_message(MessageSender::User, text);
        chat
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatStorage::new(temp_dir.path()).unwrap();

        let chats = vec![chat_with_message("Hello"), chat_with_message("World")];
        storage.save(&chats).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, chats);
    }

    #[test]
    fn test_load_without_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatStorage::new(temp_dir.path()).unwrap();

        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_keeps_last_twenty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatStorage::new(temp_dir.path()).unwrap();

        let chats: Vec<Chat> = (0..25)
            .map(|index| chat_with_message(&format!("chat {index}")))
            .collect();
        storage.save(&chats).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), MAX_STORED_CHATS);
        // Oldest entries were evicted first: the suffix survives.
        assert_eq!(loaded, chats[5..]);
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatStorage::new(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join(CHATS_FILE), "{not json").unwrap();

        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_messages_survive_round_trip_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatStorage::new(temp_dir.path()).unwrap();

        let mut chat = Chat::new();
        chat.push_message(MessageSender::User, "first");
        chat.push_message(MessageSender::Assistant, "second");
        chat.push_message(MessageSender::User, "third");

        storage.save(std::slice::from_ref(&chat)).unwrap();
        let loaded = storage.load().unwrap();

        let texts: Vec<_> = loaded[0].messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }
}
