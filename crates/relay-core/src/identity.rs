//! Durable session identity.
//!
//! The remote endpoint threads conversations by session token rather than by
//! chat id, so the token lives on disk and survives restarts. Starting a new
//! chat rotates it.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::StorageResult;

const SESSION_ID_FILE: &str = "session_id";

/// Persists the session token to `<base_dir>/session_id`.
pub struct IdentityStore {
    base_dir: PathBuf,
}

impl IdentityStore {
    /// Creates an `IdentityStore` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Returns the persisted session token, minting and persisting a fresh
    /// one if none exists yet.
    ///
    /// A missing file is "not found", not an error; only an unreadable or
    /// unwritable store fails.
    pub fn load_or_create(&self) -> StorageResult<String> {
        let path = self.token_path();

        if path.exists() {
            let token = fs::read_to_string(&path)?;
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        self.rotate()
    }

    /// Mints a new session token, persists it, and returns it.
    ///
    /// Called when starting a new chat so subsequent requests carry a fresh
    /// token and the remote endpoint opens a new conversation thread.
    pub fn rotate(&self) -> StorageResult<String> {
        let token = Uuid::new_v4().to_string();
        fs::write(self.token_path(), &token)?;
        Ok(token)
    }

    fn token_path(&self) -> PathBuf {
        self.base_dir.join(SESSION_ID_FILE)
    }
}
