// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable export checkpoint.

use std::sync::Arc;

use tracing::debug;

use ferry_core::{FerryError, PreferenceStore, RecordId};
use ferry_storage::models::{EXPORT_NAMESPACE, LAST_PROCESSED_KEY};

/// Highest processed record id, stored under `export_prefs/last_processed_id`.
///
/// Writes never move the stored value backwards, even when several processes
/// share one state database.
#[derive(Clone)]
pub struct CheckpointStore {
    prefs: Arc<dyn PreferenceStore>,
}

impl CheckpointStore {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// `None` when nothing has been processed yet.
    pub async fn load(&self) -> Result<Option<RecordId>, FerryError> {
        let Some(raw) = self.prefs.get(EXPORT_NAMESPACE, LAST_PROCESSED_KEY).await? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<RecordId>()
            .map(Some)
            .map_err(|e| FerryError::Storage {
                source: format!("stored checkpoint {raw:?} is not a record id: {e}").into(),
            })
    }

    /// Persist `id` if it is ahead of the stored checkpoint. Returns the checkpoint in effect.
    pub async fn advance(&self, id: RecordId) -> Result<RecordId, FerryError> {
        if let Some(current) = self.load().await? {
            if current >= id {
                debug!(current = %current, proposed = %id, "checkpoint not advanced");
                return Ok(current);
            }
        }
        let stored = self
            .prefs
            .put_max(EXPORT_NAMESPACE, LAST_PROCESSED_KEY, id.0)
            .await?;
        if stored > id.0 {
            debug!(current = stored, proposed = %id, "checkpoint advanced concurrently");
        }
        Ok(RecordId(stored))
    }
}
