// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use ferry_core::FerryError;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Convert a tokio-rusqlite error into FerryError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FerryError {
    FerryError::Storage {
        source: Box::new(e),
    }
}

fn map_sql_err(e: rusqlite::Error) -> FerryError {
    FerryError::Storage {
        source: Box::new(e),
    }
}

/// Handle to Ferry's own state database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply pending migrations.
    ///
    /// Schema work runs on a blocking connection before the shared async
    /// connection is opened, so the writer thread only ever sees a current schema.
    pub async fn open(path: &str) -> Result<Self, FerryError> {
        Self::open_with(path, true).await
    }

    /// Like [`Database::open`], with WAL journaling optional.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, FerryError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| FerryError::Storage {
                source: Box::new(e),
            })?;
        }

        let schema_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), FerryError> {
            let mut conn = rusqlite::Connection::open(&schema_path).map_err(map_sql_err)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(map_sql_err)?;
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| FerryError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| FerryError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "synchronous", "FULL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "state database opened");
        Ok(Self { conn })
    }

    /// The shared async connection. Query modules go through `call()`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint_wal(&self) -> Result<(), FerryError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), FerryError> {
        self.checkpoint_wal().await?;
        self.conn.close().await.map_err(|e| FerryError::Storage {
            source: Box::new(e),
        })
    }
}
