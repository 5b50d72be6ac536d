//! Token storage.
//!
//! The session lives in two independent keys, `access_token` and
//! `refresh_token`. Each key is written atomically on its own; there is
//! no transaction across them; a missing access token already means
//! "not authenticated", so a half-written session is harmless.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};

use super::SessionData;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    /// Storage name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKey::Access => "access_token",
            TokenKey::Refresh => "refresh_token",
        }
    }
}

/// Durable key-value storage for session tokens.
///
/// Implementations only need `get`, `set` and `remove`; the session-level
/// helpers are provided on top of them.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: TokenKey) -> Result<Option<String>>;

    fn set(&self, key: TokenKey, value: &str) -> Result<()>;

    /// Removing a key that is not present is not an error.
    fn remove(&self, key: TokenKey) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.get(TokenKey::Access)?.filter(|t| !t.is_empty()))
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.get(TokenKey::Refresh)?.filter(|t| !t.is_empty()))
    }

    /// Write a new session: access first, then refresh. A stale refresh
    /// token from a previous session is removed when none is issued.
    fn save_session(&self, session: &SessionData) -> Result<()> {
        self.set(TokenKey::Access, &session.access_token)?;
        match session.refresh_token {
            Some(ref refresh) => self.set(TokenKey::Refresh, refresh),
            None => self.remove(TokenKey::Refresh),
        }
    }

    fn load_session(&self) -> Result<Option<SessionData>> {
        Ok(self
            .access_token()?
            .map(|access| SessionData::new(access, self.refresh_token().ok().flatten())))
    }

    /// Remove both keys. The refresh key is removed even when removing the
    /// access key failed; the first error is returned.
    fn clear(&self) -> Result<()> {
        let access = self.remove(TokenKey::Access);
        let refresh = self.remove(TokenKey::Refresh);
        access.and(refresh)
    }
}

/// In-process token store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &SessionData) -> Self {
        let store = Self::new();
        // Writing to a fresh in-memory map cannot fail.
        let _ = store.save_session(session);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        values.remove(&key);
        Ok(())
    }
}

/// Token store persisted as a JSON object in `<cache_dir>/session.json`.
pub struct FileTokenStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: RwLock<()>,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: RwLock::new(()),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        let path = self.session_path();
        if values.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove session file")?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        let mut values = self.read_all()?;
        values.insert(key.as_str().to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        let mut values = self.read_all()?;
        if values.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write_all(&values)
    }
}
