// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory preference store and run journal.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{Component, FerryError, HealthStatus, PreferenceStore, RunJournal, RunSummary};

/// Preference store backed by a `HashMap`.
///
/// Clones share state, which lets a test "restart" a component while keeping
/// what it persisted.
#[derive(Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<HashMap<(String, String), String>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of writes that changed a value.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Direct read for assertions.
    pub async fn snapshot(&self, namespace: &str, key: &str) -> Option<String> {
        self.values
            .lock()
            .await
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    fn check_writable(&self) -> Result<(), FerryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FerryError::Storage {
                source: "preference store is read-only".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Component for MemoryPreferenceStore {
    fn name(&self) -> &str {
        "memory-preferences"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, FerryError> {
        Ok(self.snapshot(namespace, key).await)
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), FerryError> {
        self.check_writable()?;
        self.values
            .lock()
            .await
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put_max(&self, namespace: &str, key: &str, value: i64) -> Result<i64, FerryError> {
        self.check_writable()?;
        let mut values = self.values.lock().await;
        let slot = (namespace.to_string(), key.to_string());
        let stored = values.get(&slot).and_then(|v| v.trim().parse::<i64>().ok());
        match stored {
            Some(current) if current >= value => Ok(current),
            _ => {
                values.insert(slot, value.to_string());
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
        }
    }
}

/// Run journal that keeps summaries in a `Vec`.
#[derive(Clone, Default)]
pub struct MemoryRunJournal {
    runs: Arc<Mutex<Vec<RunSummary>>>,
}

impl MemoryRunJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded runs, oldest first.
    pub async fn runs(&self) -> Vec<RunSummary> {
        self.runs.lock().await.clone()
    }
}

#[async_trait]
impl RunJournal for MemoryRunJournal {
    async fn record_run(&self, summary: &RunSummary) -> Result<i64, FerryError> {
        let mut runs = self.runs.lock().await;
        runs.push(summary.clone());
        Ok(runs.len() as i64)
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>, FerryError> {
        Ok(self.runs.lock().await.iter().rev().take(limit).cloned().collect())
    }
}
