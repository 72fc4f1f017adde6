//! Chat lifecycle management.

use crate::chat_storage::ChatStorage;
use crate::error::StorageResult;
use crate::identity::IdentityStore;

use super::message::MessageSender;
use super::model::Chat;

/// Manages the chat collection and its lifecycle.
///
/// `ChatManager` is responsible for:
/// - Resolving the current chat
/// - Creating new chats (with a fresh session token)
/// - Appending messages and persisting after every mutation
/// - Switching between stored chats
///
/// It owns the in-memory collection, the persistence backend, and the
/// session identity. The current chat id is a lookup key into the
/// collection, resolved lazily by [`ChatManager::current_chat`].
pub struct ChatManager {
    chats: Vec<Chat>,
    current_chat_id: Option<String>,
    session_id: String,
    storage: ChatStorage,
    identity: IdentityStore,
}

impl ChatManager {
    /// Restores the chat collection and session identity from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory is unusable. Malformed
    /// chat data is not an error; it loads as an empty collection.
    pub fn open(storage: ChatStorage, identity: IdentityStore) -> StorageResult<Self> {
        let chats = storage.load()?;
        let session_id = identity.load_or_create()?;

        Ok(Self {
            chats,
            current_chat_id: None,
            session_id,
            storage,
            identity,
        })
    }

    /// Returns the session token sent with every request.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the stored chats, oldest first.
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Resolves the current chat, falling back so a chat always exists.
    ///
    /// Resolution order:
    /// 1. the chat matching the current-chat pointer,
    /// 2. else the most-recently-added chat,
    /// 3. else a freshly synthesized empty chat, appended to the collection.
    pub fn current_chat(&mut self) -> &Chat {
        let index = self.current_chat_index();
        &self.chats[index]
    }

    /// Starts a new empty chat, rotates the session token, and makes the
    /// new chat current.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn start_new_chat(&mut self) -> StorageResult<&Chat> {
        self.session_id = self.identity.rotate()?;

        let chat = Chat::new();
        self.current_chat_id = Some(chat.id.clone());
        self.chats.push(chat);
        self.storage.save(&self.chats)?;

        tracing::info!(chat_id = %self.chats[self.chats.len() - 1].id, "started new chat");
        Ok(&self.chats[self.chats.len() - 1])
    }

    /// Appends a message to the current chat and persists the collection.
    ///
    /// The first user message of a chat freezes its title.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutated collection cannot be persisted.
    pub fn append_message(
        &mut self,
        sender: MessageSender,
        text: impl Into<String>,
    ) -> StorageResult<()> {
        let index = self.current_chat_index();
        self.chats[index].push_message(sender, text);
        self.storage.save(&self.chats)
    }

    /// Sets the current-chat pointer.
    ///
    /// The id is not validated here; an id that no longer resolves falls
    /// through [`ChatManager::current_chat`]'s fallback chain.
    pub fn select_chat(&mut self, chat_id: impl Into<String>) {
        self.current_chat_id = Some(chat_id.into());
    }

    /// Resolves the current-chat pointer to an index, synthesizing an empty
    /// chat when the collection is empty.
    fn current_chat_index(&mut self) -> usize {
        if let Some(id) = &self.current_chat_id
            && let Some(index) = self.chats.iter().position(|chat| &chat.id == id)
        {
            return index;
        }

        if self.chats.is_empty() {
            self.chats.push(Chat::new());
        }

        self.chats.len() - 1
    }
}
