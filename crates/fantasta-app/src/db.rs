// SQLite persistence layer for draft snapshots.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::store::SnapshotStore;

/// Key under which the live session snapshot is stored.
pub const CURRENT_KEY: &str = "current";

/// SQLite-backed snapshot storage: the latest snapshot per key plus an
/// append-only history of every save.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                key      TEXT PRIMARY KEY,
                state    TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshot_history (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                key      TEXT NOT NULL,
                state    TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A poisoned lock still holds a usable connection; SQLite keeps its own
    /// transactional consistency.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` as the latest snapshot under `key` and append it to the
    /// history log, in one transaction.
    pub fn save_snapshot(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let mut conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize snapshot")?;
        let saved_at = Utc::now().to_rfc3339();

        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "INSERT OR REPLACE INTO snapshots (key, state, saved_at) VALUES (?1, ?2, ?3)",
            params![key, json_str, saved_at],
        )
        .context("failed to save snapshot")?;
        tx.execute(
            "INSERT INTO snapshot_history (key, state, saved_at) VALUES (?1, ?2, ?3)",
            params![key, json_str, saved_at],
        )
        .context("failed to append snapshot history")?;
        tx.commit().context("failed to commit snapshot")?;
        Ok(())
    }

    /// Load the latest snapshot under `key`, or `None` if nothing was saved.
    pub fn load_snapshot(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT state FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query snapshot")?;

        match json_str {
            Some(s) => {
                let value = serde_json::from_str(&s).context("failed to deserialize snapshot")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// When the snapshot under `key` was last written.
    pub fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let ts: Option<String> = conn
            .query_row(
                "SELECT saved_at FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query snapshot timestamp")?;

        ts.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid snapshot timestamp '{s}'"))
        })
        .transpose()
    }

    /// Number of saves recorded for `key`.
    #[cfg(test)]
    fn history_len(&self, key: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM snapshot_history WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .context("failed to count snapshot history")?;
        Ok(count as usize)
    }

    /// Delete every snapshot and the whole history.
    #[cfg(test)]
    fn clear(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "DELETE FROM snapshots;
             DELETE FROM snapshot_history;",
        )
        .context("failed to clear snapshots")?;
        Ok(())
    }
}

impl SnapshotStore for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn save(&self, snapshot: &serde_json::Value) -> Result<()> {
        self.save_snapshot(CURRENT_KEY, snapshot)
    }

    fn load(&self) -> Result<Option<serde_json::Value>> {
        self.load_snapshot(CURRENT_KEY)
    }

    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Database::saved_at(self, CURRENT_KEY)
    }
}
