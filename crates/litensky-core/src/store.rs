//! Key-value persistence for dashboard state.
//!
//! `KeyValueStore` is the raw string store (SQLite on disk, a map in memory).
//! `Storage` layers JSON encoding on top and swallows every failure: reads fall
//! back to a default, writes are logged and dropped. Nothing persisted here is
//! ever a source of hard failure.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RusqliteErrorExt, StoreError};

/// Storage keys used by the dashboard.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const CITY: &str = "city";
    pub const RECENT_CITIES: &str = "recentCities";
    pub const WEATHER_CACHE: &str = "weatherCache";
    pub const CITY_IMAGES: &str = "cityImages";
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory store (tests and ephemeral sessions).
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// SQLite-backed store. One row per key.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    pub fn in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
                );
                "#,
            )
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into_store_error(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
                params![key, value],
            )
            .map_err(|e| StoreError::write(key, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| StoreError::write(key, e))?;
        Ok(())
    }
}

/// JSON view over a `KeyValueStore` with best-effort semantics.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Storage backed by a fresh `MemoryStore`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Decode the value at `key`, or `None` if absent or unreadable.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read stored key \"{}\": {}", key, e);
                None
            }
        }
    }

    /// Decode the value at `key`, substituting `default` on any failure.
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.read(key).unwrap_or(default)
    }

    /// Fallible read, for callers that need to tell "absent" from "broken".
    pub fn try_read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.inner.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::malformed(key, e))
    }

    /// Encode and write `value`. Failures are logged and swallowed.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| StoreError::write(key, e))
            .and_then(|raw| self.inner.set(key, &raw));
        if let Err(e) = result {
            tracing::warn!("Failed to write stored key \"{}\": {}", key, e);
        }
    }

    /// Remove `key`. Failures are logged and swallowed.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.inner.remove(key) {
            tracing::warn!("Failed to remove stored key \"{}\": {}", key, e);
        }
    }
}
