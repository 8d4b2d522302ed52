//! Session storage for the chirp client
//!
//! The session lives in a flat key/value store under four string keys, the
//! same layout the web client keeps in local storage. `currentUser` holds the
//! user record serialized as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ChirpError, Result};

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const ID_TOKEN_KEY: &str = "idToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Every key a session occupies
pub const SESSION_KEYS: [&str; 4] = [
    CURRENT_USER_KEY,
    ACCESS_TOKEN_KEY,
    ID_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
];

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl User {
    /// Name shown next to the avatar
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Tokens plus the user they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// Flat string storage. Batched writes and removals are applied as a unit.
pub trait KeyValueStorage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()>;
    fn remove_many(&mut self, keys: &[&str]) -> Result<()>;
}

/// In-process storage, used when persistence is disabled and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk, rewritten on every batch
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path)?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ChirpError::io_from_error("Failed to read session storage", e))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Unreadable storage behaves like empty storage: the user logs in again.
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session storage");
                Ok(BTreeMap::new())
            }
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChirpError::storage_write("Failed to create storage directory", e)
            })?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;

        fs::write(&self.path, content)
            .map_err(|e| ChirpError::storage_write("Failed to write session storage", e))?;

        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        self.flush()
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        self.flush()
    }
}

/// Session persistence on top of a key/value backend
pub struct TokenStore {
    storage: Box<dyn KeyValueStorage>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// File-backed store in the configured storage directory, or a memory
    /// store when persistence is turned off
    pub fn open(config: &Config) -> Result<Self> {
        if config.token_storage_enabled {
            let storage = FileStorage::open(config.session_path())?;
            tracing::debug!(path = %storage.path().display(), "using session file");
            Ok(Self::new(storage))
        } else {
            Ok(Self::in_memory())
        }
    }

    /// Persist all four session entries in one write
    pub fn save(&mut self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.storage.set_many(&[
            (ACCESS_TOKEN_KEY, session.access_token.clone()),
            (ID_TOKEN_KEY, session.id_token.clone()),
            (REFRESH_TOKEN_KEY, session.refresh_token.clone()),
            (CURRENT_USER_KEY, user_json),
        ])
    }

    /// The complete session, or `None` when any entry is missing or unreadable
    pub fn load(&self) -> Option<Session> {
        Some(Session {
            user: self.current_user()?,
            access_token: self.access_token()?,
            id_token: self.storage.get(ID_TOKEN_KEY)?,
            refresh_token: self.storage.get(REFRESH_TOKEN_KEY)?,
        })
    }

    /// Remove every session entry
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_many(&SESSION_KEYS)
    }

    pub fn current_user(&self) -> Option<User> {
        let raw = self.storage.get(CURRENT_USER_KEY)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user record is unreadable");
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    #[cfg(test)]
    pub fn has_entry(&self, key: &str) -> bool {
        self.storage.get(key).is_some()
    }
}
