// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch dispatch: deliver a batch through the pool and decide the new checkpoint.

use std::sync::Arc;

use tracing::{info, warn};

use ferry_config::model::DeliveryConfig;
use ferry_core::{
    CheckpointPolicy, DeliveryClient, DeliveryOutcome, Record, RecordId, RecordOutcome,
};

use crate::pool::WorkerPool;

/// Result of delivering one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// One outcome per record, in batch order.
    pub outcomes: Vec<RecordOutcome>,
    /// Checkpoint to persist. Never lower than the checkpoint passed in.
    pub next_checkpoint: Option<RecordId>,
}

impl BatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Couples a delivery client, a worker pool and a checkpoint policy.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn DeliveryClient>,
    pool: WorkerPool,
    policy: CheckpointPolicy,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn DeliveryClient>, pool: WorkerPool, policy: CheckpointPolicy) -> Self {
        Self {
            client,
            pool,
            policy,
        }
    }

    /// Build from configuration: `workers` senders, each bounded by the request timeout.
    pub fn from_config(client: Arc<dyn DeliveryClient>, config: &DeliveryConfig) -> Self {
        Self::new(
            client,
            WorkerPool::new(config.workers, config.request_timeout()),
            config.checkpoint_policy,
        )
    }

    pub fn policy(&self) -> CheckpointPolicy {
        self.policy
    }

    /// Deliver `batch` and wait until every record has an outcome.
    pub async fn deliver(&self, current: Option<RecordId>, batch: &[Record]) -> BatchReport {
        if batch.is_empty() {
            return BatchReport {
                outcomes: Vec::new(),
                next_checkpoint: current,
            };
        }

        let outcomes = self.pool.run(self.client.clone(), batch).await;

        for outcome in &outcomes {
            if let DeliveryOutcome::Failure(failure) = &outcome.outcome {
                warn!(
                    record_id = %outcome.id,
                    kind = failure.kind(),
                    error = %failure,
                    "record delivery failed"
                );
            }
        }

        let next_checkpoint = self.policy.next_checkpoint(current, &outcomes);
        let report = BatchReport {
            outcomes,
            next_checkpoint,
        };

        info!(
            records = batch.len(),
            delivered = report.delivered(),
            failed = report.failed(),
            policy = %self.policy,
            checkpoint_before = ?current.map(|id| id.0),
            checkpoint_after = ?report.next_checkpoint.map(|id| id.0),
            "batch dispatched"
        );
        report
    }
}
