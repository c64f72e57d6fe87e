//! Storage layer for bookmarkhub.
//!
//! This module provides a `SQLite`-backed key/value store. Each application
//! key holds one JSON document (the bookmark array, the category array, the
//! privacy verifier, the encrypted privacy blob). Writes replace the whole
//! document; there is no finer-grained indexing.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Storage keys used by bookmarkhub.
pub mod keys {
    /// Prefix shared by every application key.
    pub const PREFIX: &str = "bookmarkhub_";

    /// Main partition bookmarks.
    pub const BOOKMARKS: &str = "bookmarkhub_bookmarks";

    /// Main partition categories.
    pub const CATEGORIES: &str = "bookmarkhub_categories";

    /// Privacy password verifier.
    pub const PRIVACY_PASSWORD: &str = "bookmarkhub_privacy_password";

    /// Encrypted privacy partition.
    pub const PRIVACY_DATA_SECURE: &str = "bookmarkhub_privacy_data_secure";

    /// Plaintext privacy bookmarks written by older releases.
    pub const LEGACY_PRIVACY_BOOKMARKS: &str = "bookmarkhub_privacy_bookmarks";

    /// Plaintext privacy categories written by older releases.
    pub const LEGACY_PRIVACY_CATEGORIES: &str = "bookmarkhub_privacy_categories";
}

/// Key/value store for application documents.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store a raw string under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        Self::upsert(&self.conn, key, value)?;
        debug!(key, bytes = value.len(), "Stored entry");
        Ok(())
    }

    /// Store several entries in one transaction.
    ///
    /// Either every entry is written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    pub fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            Self::upsert(&tx, key, value)?;
        }
        tx.commit()?;
        debug!(count = entries.len(), "Stored entries");
        Ok(())
    }

    fn upsert(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            r"
            INSERT INTO entries (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove the entry under `key`.
    ///
    /// Returns `true` if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", [key])?;
        if affected > 0 {
            debug!(key, "Removed entry");
        }
        Ok(affected > 0)
    }

    /// Whether an entry exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn contains(&self, key: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE key = ?1",
            [key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Read and decode the JSON document under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptEntry`] if the stored value is not valid JSON
    /// for `T`, or an error if the database operation fails.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| Error::CorruptEntry {
                key: key.to_string(),
                source,
            })
    }

    /// Encode `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    /// All stored keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Delete every application entry.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_app_data(&self) -> Result<usize> {
        let affected = self.conn.execute(
            r"DELETE FROM entries WHERE key LIKE ?1 ESCAPE '\'",
            [app_key_pattern()],
        )?;
        info!("Cleared {} stored entries", affected);
        Ok(affected)
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (entries, app_bytes, last_updated): (i64, i64, Option<String>) = self.conn.query_row(
            r"
            SELECT COUNT(*), COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0), MAX(updated_at)
            FROM entries WHERE key LIKE ?1 ESCAPE '\'
            ",
            [app_key_pattern()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let last_updated = last_updated
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok())
            .map(|dt| dt.and_utc());

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            entries: usize::try_from(entries).unwrap_or(0),
            app_bytes: u64::try_from(app_bytes).unwrap_or(0),
            last_updated,
            db_size_bytes,
            schema_version: migrations::schema_version(&self.conn)?,
        })
    }
}

/// `LIKE` pattern matching application keys; `_` is escaped.
fn app_key_pattern() -> String {
    format!("{}%", keys::PREFIX.replace('_', r"\_"))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of application entries.
    pub entries: usize,
    /// Characters used by application keys and values.
    pub app_bytes: u64,
    /// When an application entry was last written.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
    /// Schema version of the database.
    pub schema_version: i32,
}
