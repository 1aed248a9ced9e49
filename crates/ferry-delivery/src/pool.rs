// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded parallel delivery with per-record timeout and failure isolation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use ferry_core::{DeliveryClient, DeliveryFailure, DeliveryOutcome, Record, RecordOutcome};

/// Fixed-size pool that sends a batch through a [`DeliveryClient`].
///
/// At most `workers` sends are in flight. Every send is cut off after
/// `timeout`; a timeout, error or panic in one task only affects that
/// record's outcome.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    timeout: Duration,
}

impl WorkerPool {
    pub fn new(workers: usize, timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Deliver every record and wait for all of them.
    ///
    /// Outcomes are returned in batch order regardless of completion order.
    pub async fn run(
        &self,
        client: Arc<dyn DeliveryClient>,
        batch: &[Record],
    ) -> Vec<RecordOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set: JoinSet<(usize, DeliveryOutcome)> = JoinSet::new();

        for (index, record) in batch.iter().cloned().enumerate() {
            // The semaphore is never closed, so acquire only fails if it is dropped.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let client = client.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let _permit = permit;
                let attempt = AssertUnwindSafe(tokio::time::timeout(timeout, client.send(&record)))
                    .catch_unwind()
                    .await;
                let outcome = match attempt {
                    Ok(Ok(result)) => DeliveryOutcome::from(result),
                    Ok(Err(_elapsed)) => {
                        DeliveryOutcome::Failure(DeliveryFailure::Timeout { duration: timeout })
                    }
                    Err(_panic) => DeliveryOutcome::Failure(DeliveryFailure::Aborted(
                        "delivery task panicked".to_string(),
                    )),
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<DeliveryOutcome>> = vec![None; batch.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(join_err) => error!(error = %join_err, "delivery task failed to join"),
            }
        }

        batch
            .iter()
            .zip(outcomes)
            .map(|(record, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    warn!(record_id = %record.id, "delivery task ended without an outcome");
                    DeliveryOutcome::Failure(DeliveryFailure::Aborted(
                        "delivery task ended without an outcome".to_string(),
                    ))
                });
                RecordOutcome {
                    id: record.id,
                    outcome,
                }
            })
            .collect()
    }
}
