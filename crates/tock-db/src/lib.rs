//! Storage layer for tock.
//!
//! Persists the alarm rule list using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Alarm state is only touched from the thread that owns the matcher, so a
//! single connection per process is enough.
//!
//! # Schema
//!
//! A single key/value table. Values are opaque text blobs; the rule list lives
//! under [`ALARMS_KEY`] as the JSON array produced by
//! [`tock_core::rule::encode_rules`].
//!
//! `updated_at` is stored as TEXT in ISO 8601 format (e.g. `2026-10-17T07:00:00Z`).

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tock_core::{ALARMS_KEY, RuleStore};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns the blob stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: &str) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, now],
        )?;
        tracing::trace!(key, bytes = value.len(), "stored blob");
        Ok(())
    }
}

impl RuleStore for Database {
    type Error = DbError;

    fn load_blob(&self) -> Result<Option<String>, Self::Error> {
        self.get(ALARMS_KEY)
    }

    fn save_blob(&self, blob: &str) -> Result<(), Self::Error> {
        self.put(ALARMS_KEY, blob)
    }
}
