use std::path::PathBuf;

use anyhow::{Context, Result};
use keyring::Entry;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{self, TokenStoreKind};

/// Key the session token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Keyring service name
const SERVICE_NAME: &str = "brainely";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Persistent slot holding the session token. Last write wins.
pub trait TokenStore: Send {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&mut self, token: &str) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Open the token store selected in settings.
pub fn open_token_store(kind: TokenStoreKind) -> Result<Box<dyn TokenStore>> {
    match kind {
        TokenStoreKind::File => {
            let path = config::data_dir()?.join(STORAGE_FILE);
            Ok(Box::new(FileTokenStore::new(path)))
        }
        TokenStoreKind::Keyring => Ok(Box::new(KeyringTokenStore)),
    }
}

// ============================================================================
// File
// ============================================================================

/// Key-value JSON file, the terminal counterpart of browser local storage.
///
/// Other keys in the file are preserved on write.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the whole file. A missing or unparseable file reads as empty
    /// so a damaged file never blocks the next write.
    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Storage file unreadable, starting empty");
                Ok(Map::new())
            }
        }
    }

    /// Write through a sibling temp file and rename over the target.
    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write storage file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(match self.read_map()?.remove(TOKEN_KEY) {
            Some(Value::String(token)) => Some(token),
            _ => None,
        })
    }

    fn save(&mut self, token: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_map(&map)?;
        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut map = self.read_map()?;
        map.remove(TOKEN_KEY);
        self.write_map(&map)
    }
}

// ============================================================================
// OS keychain
// ============================================================================

pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&mut self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&mut self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileTokenStore::new(dir.path().join("nested").join(STORAGE_FILE));

        assert_eq!(store.load().expect("load"), None);

        store.save("abc123").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc123"));

        store.save("def456").expect("overwrite");
        assert_eq!(store.load().expect("load").as_deref(), Some("def456"));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn test_file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, r#"{"theme":"dark"}"#).expect("seed");

        let mut store = FileTokenStore::new(path.clone());
        store.save("abc123").expect("save");

        let contents = std::fs::read_to_string(&path).expect("read");
        let map: Map<String, Value> = serde_json::from_str(&contents).expect("parse");
        assert_eq!(map.get("theme").and_then(Value::as_str), Some("dark"));
        assert_eq!(map.get(TOKEN_KEY).and_then(Value::as_str), Some("abc123"));
    }

    #[test]
    fn test_file_store_overwrites_truncated_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, r#"{"token":"ol"#).expect("seed");

        let mut store = FileTokenStore::new(path.clone());
        assert_eq!(store.load().expect("load"), None);

        store.save("abc123").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc123"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_keeps_non_string_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, r#"{"theme":1}"#).expect("seed");

        let mut store = FileTokenStore::new(path.clone());
        store.save("abc123").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc123"));

        store.clear().expect("clear");
        let contents = std::fs::read_to_string(&path).expect("read");
        let map: Map<String, Value> = serde_json::from_str(&contents).expect("parse");
        assert_eq!(map.get("theme"), Some(&Value::from(1)));
        assert!(map.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_file_store_clear_recovers_damaged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "not json").expect("seed");

        let mut store = FileTokenStore::new(path);
        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn test_file_store_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the file should be makes the write fail.
        let path = dir.path().join(STORAGE_FILE);
        std::fs::create_dir_all(&path).expect("mkdir");

        let mut store = FileTokenStore::new(path);
        assert!(store.save("abc123").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(store.token(), None);
        store.save("abc123").expect("save");
        assert_eq!(store.token(), Some("abc123"));
        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn TokenStore> = Box::new(MemoryTokenStore::new());
        store.save("abc123").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc123"));
    }
}
