// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes each query function atomic with respect to the
//! others. Do NOT create additional Connection instances for writes.

use std::path::Path;

use dealcast_core::DealcastError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the Dealcast SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and
    /// applies pending migrations.
    pub async fn open(path: &str) -> Result<Self, DealcastError> {
        Self::open_with(path, true).await
    }

    /// Opens the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, DealcastError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DealcastError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations need a `&mut rusqlite::Connection`, so they run on a plain
        // connection before the async handle takes over.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), DealcastError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| DealcastError::Storage {
                    source: Box::new(e),
                })?;
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")
                    .map_err(|e| DealcastError::Storage {
                        source: Box::new(e),
                    })?;
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| DealcastError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| DealcastError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), DealcastError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| DealcastError::Storage {
                source: format!("failed to close database: {e}").into(),
            })
    }
}

/// Convert tokio-rusqlite errors to `DealcastError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DealcastError {
    DealcastError::Storage {
        source: Box::new(e),
    }
}
