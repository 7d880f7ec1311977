// 🗄️ Key-Value Store - the only persistence mechanism of the parking core
//
// String key → string value. Callers do read-modify-write on whole values.
// `set_many` is the one all-or-nothing primitive: either every entry lands or none does.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a single value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several values atomically
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// Key-value table in SQLite
///
/// rusqlite connections are not `Sync`, so the connection sits behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store file, WAL mode for crash recovery
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("store connection lock poisoned"))
    }
}

const UPSERT: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Failed to read {}", key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(UPSERT, params![key, value, Utc::now().to_rfc3339()])
            .with_context(|| format!("Failed to write {}", key))?;
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for (key, value) in entries {
            tx.execute(UPSERT, params![key, value, now])
                .with_context(|| format!("Failed to write {}", key))?;
        }

        // Dropping `tx` on an early return rolls everything back
        tx.commit().context("Failed to commit batch write")?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// HashMap-backed store, cheap to clone (clones share the same map)
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&self, batch: &[(&str, String)]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
