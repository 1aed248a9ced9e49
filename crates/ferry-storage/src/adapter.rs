// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed preference store and run journal.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use ferry_config::model::StorageConfig;
use ferry_core::{Component, FerryError, HealthStatus, PreferenceStore, RunJournal, RunSummary};

use crate::database::Database;
use crate::queries;

/// Ferry's state database: checkpoint, wake plan and run history.
///
/// The database is opened by [`SqliteStateStore::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStateStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStateStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), FerryError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FerryError::Storage {
            source: "state store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "state store initialized");
        Ok(())
    }

    /// Flush the WAL so the on-disk file is complete.
    pub async fn close(&self) -> Result<(), FerryError> {
        if let Some(db) = self.db.get() {
            db.checkpoint_wal().await?;
            debug!("state store WAL checkpoint complete");
        }
        Ok(())
    }

    fn db(&self) -> Result<&Database, FerryError> {
        self.db.get().ok_or_else(|| FerryError::Storage {
            source: "state store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Component for SqliteStateStore {
    fn name(&self) -> &str {
        "sqlite-state"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PreferenceStore for SqliteStateStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, FerryError> {
        queries::preferences::get(self.db()?, namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), FerryError> {
        queries::preferences::put(self.db()?, namespace, key, value).await
    }

    async fn put_max(&self, namespace: &str, key: &str, value: i64) -> Result<i64, FerryError> {
        queries::preferences::put_max(self.db()?, namespace, key, value).await
    }
}

#[async_trait]
impl RunJournal for SqliteStateStore {
    async fn record_run(&self, summary: &RunSummary) -> Result<i64, FerryError> {
        queries::runs::insert_run(self.db()?, summary).await
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>, FerryError> {
        let runs = queries::runs::recent_runs(self.db()?, limit).await?;
        Ok(runs.into_iter().map(|r| r.summary).collect())
    }
}
