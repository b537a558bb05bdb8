//! SQLite-backed durable shared store.
//!
//! One row per logical key. The app and the trigger handler open the same
//! file from separate processes; WAL mode plus a busy timeout lets an
//! overlapping pair wait for each other instead of failing, and
//! `synchronous=FULL` makes every `put` durable before it returns.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use super::{data_dir, migrations, KvStore};
use crate::error::StoreError;

const DB_FILE: &str = "versegate.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database acting as the durable shared store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store at `<data_dir>/versegate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.configure()?;
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened shared store");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    fn configure(&self) -> Result<(), StoreError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            self.conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::trace!(journal_mode = %mode);
        self.conn.pragma_update(None, "synchronous", "FULL")?;
        Ok(())
    }

    fn migrate(&self) -> Result<(), StoreError> {
        migrations::migrate(&self.conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    /// All keys currently present, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }

    /// When `key` was last written, as an RFC 3339 timestamp.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Delete every stored entity. Returns the number of keys removed.
    pub fn reset(&self) -> Result<usize, StoreError> {
        let removed = self.conn.execute("DELETE FROM kv", [])?;
        tracing::info!(removed, "shared store reset");
        Ok(removed)
    }
}

impl KvStore for Database {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(key, bytes = value.len(), "store put");
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let result = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional();
        match result {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed, treating as absent");
                None
            }
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        tracing::debug!(key, "store remove");
        Ok(())
    }
}
