//! Session persistence
//!
//! The session is two entries in a small key/value store: the opaque bearer token and
//! the JSON-serialized [`User`] profile. [`SessionStore`] wraps an optional
//! [`SessionStorage`] backend; without one every operation is a no-op that reports
//! "nothing stored", which is how ephemeral or sandboxed runs behave.
//!
//! Storage failures never escape the store. They are logged and treated as if the
//! storage were unavailable.

use crate::models::User;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "auth_user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Session storage lock poisoned")]
    Poisoned,
}

/// Key/value backend for the session store
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Process-local storage, used by tests and runs seeded with `--token`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, SessionError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Entries to rewrite on a change, and whether the file was corrupt.
    /// A corrupt file is replaced rather than blocking writes.
    fn entries_for_update(&self) -> Result<(Map<String, Value>, bool), SessionError> {
        match self.read_entries() {
            Ok(entries) => Ok((entries, false)),
            Err(SessionError::Corrupt(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                Ok((Map::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;

        // Renamed over the target; a crash never leaves a partial file
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        {
            let mut file = create_private(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A leftover temp file keeps its old mode
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().map_err(|_| SessionError::Poisoned)?;
        let entries = self.read_entries()?;
        Ok(entries.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().map_err(|_| SessionError::Poisoned)?;
        let (mut entries, _) = self.entries_for_update()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().map_err(|_| SessionError::Poisoned)?;
        let (mut entries, corrupt) = self.entries_for_update()?;
        if entries.remove(key).is_some() || corrupt {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Token and user profile persistence shared by the API client and the auth flows
#[derive(Clone)]
pub struct SessionStore {
    storage: Option<Arc<dyn SessionStorage>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("available", &self.storage.is_some())
            .finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage: Some(storage) }
    }

    /// Store with no backend; reads return nothing and writes are dropped
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read session storage");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set(key, value) {
                warn!(key, error = %e, "Failed to write session storage");
            }
        }
    }

    fn delete(&self, key: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.remove(key) {
                warn!(key, error = %e, "Failed to remove session entry");
            }
        }
    }

    pub fn set_token(&self, token: &str) {
        debug!("Storing auth token");
        self.write(TOKEN_KEY, token);
    }

    pub fn get_token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    /// Clear the token and the cached user
    pub fn remove_token(&self) {
        debug!("Removing auth token and cached user");
        self.delete(TOKEN_KEY);
        self.delete(USER_KEY);
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(json) => self.write(USER_KEY, &json),
            Err(e) => warn!(error = %e, "Failed to serialize user profile"),
        }
    }

    /// Cached user profile; malformed entries read as `None`
    pub fn get_user(&self) -> Option<User> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Failed to parse stored user profile");
                None
            }
        }
    }

    /// Token presence only; no expiry check and no server round-trip
    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "pharmacist".to_string(),
            full_name: Some("Abebe Kebede".to_string()),
        }
    }

    #[test]
    fn test_token_lifecycle() {
        let store = SessionStore::in_memory();
        assert!(!store.is_authenticated());

        store.set_token("x");
        assert!(store.is_authenticated());
        assert_eq!(store.get_token().as_deref(), Some("x"));

        store.set_user(&sample_user());
        store.remove_token();
        assert!(!store.is_authenticated());
        assert!(store.get_user().is_none());
    }

    #[test]
    fn test_user_roundtrip() {
        let store = SessionStore::in_memory();
        store.set_user(&sample_user());
        assert_eq!(store.get_user(), Some(sample_user()));
    }

    #[test]
    fn test_malformed_user_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, "{not json").unwrap();
        let store = SessionStore::new(storage);
        assert!(store.get_user().is_none());
    }

    #[test]
    fn test_unavailable_store_is_noop() {
        let store = SessionStore::unavailable();
        store.set_token("x");
        store.set_user(&sample_user());
        assert!(!store.is_available());
        assert!(store.get_token().is_none());
        assert!(store.get_user().is_none());
        assert!(!store.is_authenticated());
        store.remove_token();
    }
}
