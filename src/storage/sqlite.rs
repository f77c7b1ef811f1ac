//! `SQLite` backend: a single `kv` table in `tripid.sqlite`.

use std::{fs, path::PathBuf};

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use super::{KeyValueStore, Result, validate_key};

/// Database file name under the store root.
const DB_FILE: &str = "tripid.sqlite";

/// Key-value store backed by one `SQLite` file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) `tripid.sqlite` under `root` and ensures the schema.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join(DB_FILE))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        debug!(key, bytes = value.len(), "wrote row");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM kv", [])?;
        debug!(rows, "cleared rows");
        Ok(())
    }
}
