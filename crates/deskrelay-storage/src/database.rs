// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. Query modules accept `&Database` and call through
//! [`Database::connection`]. Do NOT create additional connections for writes:
//! the atomicity of bulk session transitions relies on every `UPDATE` running
//! on this one thread.

use deskrelay_core::RelayError;
use tracing::debug;

use crate::migrations;

/// Handle to the deskrelay SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and apply
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, RelayError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode.
    ///
    /// Migrations run on a short-lived blocking connection before the
    /// long-lived async connection is created.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, RelayError> {
        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || prepare_schema(&setup_path, wal_mode))
            .await
            .map_err(|e| RelayError::Internal(format!("schema setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RelayError::storage)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single async connection all queries run through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), RelayError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn prepare_schema(path: &str, wal_mode: bool) -> Result<(), RelayError> {
    let mut conn = rusqlite::Connection::open(path).map_err(RelayError::storage)?;
    let journal = if wal_mode { "WAL" } else { "DELETE" };
    let applied: String = conn
        .pragma_update_and_check(None, "journal_mode", journal, |row| row.get(0))
        .map_err(RelayError::storage)?;
    debug!(journal_mode = %applied, "journal mode set");
    migrations::run_migrations(&mut conn)
}

/// Convert a tokio-rusqlite error into `RelayError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RelayError {
    RelayError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for expected in ["bot_sessions", "messages", "tenant_settings"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}: {tables:?}");
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();

        let first = Database::open(path).await.unwrap();
        first.close().await.unwrap();
        drop(first);

        let second = Database::open(path).await.unwrap();
        second.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
