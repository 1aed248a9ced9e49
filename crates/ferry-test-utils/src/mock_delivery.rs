// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted delivery client.
//!
//! `MockDelivery` succeeds by default. Individual record ids can be scripted
//! to fail, to take a while, or to hang, and every attempt is captured so
//! tests can assert what reached the "collector" and how many sends ran at
//! once.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use ferry_core::{Component, DeliveryClient, DeliveryFailure, FerryError, HealthStatus, Record, RecordId};

#[derive(Default)]
struct Script {
    failures: HashMap<RecordId, DeliveryFailure>,
    delays: HashMap<RecordId, Duration>,
    default_delay: Option<Duration>,
}

/// A delivery client for tests. Clones share state.
#[derive(Clone)]
pub struct MockDelivery {
    script: Arc<Mutex<Script>>,
    attempts: Arc<Mutex<Vec<Record>>>,
    delivered: Arc<Mutex<Vec<Record>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl MockDelivery {
    /// A client that accepts every record immediately.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            attempts: Arc::new(Mutex::new(Vec::new())),
            delivered: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// A client whose sends block until [`open_gate`](Self::open_gate) is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Let every blocked and future send proceed.
    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
        }
    }

    /// Script `id` to fail with `failure`.
    pub async fn fail(&self, id: i64, failure: DeliveryFailure) {
        self.script.lock().await.failures.insert(RecordId(id), failure);
    }

    /// Script `id` to take `delay` before answering.
    pub async fn delay(&self, id: i64, delay: Duration) {
        self.script.lock().await.delays.insert(RecordId(id), delay);
    }

    /// Script `id` to never answer within any reasonable timeout.
    pub async fn hang(&self, id: i64) {
        self.delay(id, Duration::from_secs(24 * 60 * 60)).await;
    }

    /// Delay applied to every record without its own scripted delay.
    pub async fn delay_all(&self, delay: Duration) {
        self.script.lock().await.default_delay = Some(delay);
    }

    /// Every record `send` was called with, in call order.
    pub async fn attempts(&self) -> Vec<Record> {
        self.attempts.lock().await.clone()
    }

    /// Records that were accepted, in completion order.
    pub async fn delivered(&self) -> Vec<Record> {
        self.delivered.lock().await.clone()
    }

    /// Ids of accepted records, sorted.
    pub async fn delivered_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.delivered.lock().await.iter().map(|r| r.id.0).collect();
        ids.sort_unstable();
        ids
    }

    /// Highest number of sends that were in progress at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockDelivery {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Component for MockDelivery {
    fn name(&self) -> &str {
        "mock-delivery"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl DeliveryClient for MockDelivery {
    async fn send(&self, record: &Record) -> Result<(), DeliveryFailure> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.attempts.lock().await.push(record.clone());

        if let Some(gate) = &self.gate {
            // A closed semaphore means the gate is open.
            let _ = gate.acquire().await;
        }

        let (failure, delay) = {
            let script = self.script.lock().await;
            (
                script.failures.get(&record.id).cloned(),
                script.delays.get(&record.id).copied().or(script.default_delay),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(failure) => Err(failure),
            None => {
                self.delivered.lock().await.push(record.clone());
                Ok(())
            }
        }
    }
}
