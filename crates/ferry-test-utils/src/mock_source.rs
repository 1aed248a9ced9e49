// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message source with the same filtering rules as the SQLite reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{Component, FerryError, HealthStatus, MessageSource, Record, RecordId};

/// Message source backed by a `Vec<Record>`. Clones share state.
#[derive(Clone, Default)]
pub struct MockSource {
    records: Arc<Mutex<Vec<Record>>>,
    reads: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Self::default()
        }
    }

    pub async fn push(&self, record: Record) {
        self.records.lock().await.push(record);
    }

    /// Make reads fail with [`FerryError::StoreUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `read_batch` calls, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Component for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("store offline".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessageSource for MockSource {
    async fn read_batch(
        &self,
        after: Option<RecordId>,
        cap: usize,
    ) -> Result<Vec<Record>, FerryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FerryError::StoreUnavailable {
                source: "store offline".into(),
            });
        }

        let mut batch: Vec<Record> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| after.is_none_or(|a| r.id > a))
            .cloned()
            .collect();
        batch.sort_by_key(|r| (r.timestamp, r.id));
        batch.truncate(cap);
        Ok(batch)
    }
}
