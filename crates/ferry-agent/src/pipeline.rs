// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One export scan: read past the checkpoint, deliver, advance.

use std::sync::Arc;

use tracing::{error, info, warn};

use ferry_core::{FerryError, MessageSource, RecordId, RunJournal, RunStatus, RunSummary};
use ferry_delivery::Dispatcher;
use ferry_scheduler::now_epoch_millis;

use crate::checkpoint::CheckpointStore;

/// The scan body run by every activation.
///
/// A failure before delivery (checkpoint unreadable, store unavailable)
/// aborts with nothing written. After delivery the checkpoint is written
/// exactly once, by this task, never by a delivery worker.
pub struct ExportPipeline {
    source: Arc<dyn MessageSource>,
    dispatcher: Dispatcher,
    checkpoints: CheckpointStore,
    journal: Option<Arc<dyn RunJournal>>,
    batch_cap: usize,
}

impl ExportPipeline {
    pub fn new(
        source: Arc<dyn MessageSource>,
        dispatcher: Dispatcher,
        checkpoints: CheckpointStore,
        batch_cap: usize,
    ) -> Self {
        Self {
            source,
            dispatcher,
            checkpoints,
            journal: None,
            batch_cap,
        }
    }

    /// Append a summary of every run to `journal`.
    pub fn with_journal(mut self, journal: Arc<dyn RunJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub async fn run_once(&self) -> Result<RunSummary, FerryError> {
        let started_at_ms = now_epoch_millis();

        let before = match self.checkpoints.load().await {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                error!(error = %e, "failed to load checkpoint, run aborted");
                self.abort(started_at_ms, None, 0, &e).await;
                return Err(e);
            }
        };

        let batch = match self.source.read_batch(before, self.batch_cap).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    error = %e,
                    checkpoint = ?before.map(|id| id.0),
                    "message store unavailable, run aborted"
                );
                self.abort(started_at_ms, before, 0, &e).await;
                return Err(e);
            }
        };

        if batch.is_empty() {
            info!(checkpoint = ?before.map(|id| id.0), "no new records");
            let summary = RunSummary {
                started_at_ms,
                finished_at_ms: now_epoch_millis(),
                status: RunStatus::Empty,
                records_read: 0,
                delivered: 0,
                failed: 0,
                checkpoint_before: before,
                checkpoint_after: before,
                error: None,
            };
            self.journal(&summary).await;
            return Ok(summary);
        }

        let report = self.dispatcher.deliver(before, &batch).await;

        let after = match report.next_checkpoint {
            Some(next) if Some(next) > before => match self.checkpoints.advance(next).await {
                Ok(stored) => Some(stored),
                Err(e) => {
                    error!(error = %e, checkpoint = %next, "failed to persist checkpoint");
                    self.abort(started_at_ms, before, batch.len(), &e).await;
                    return Err(e);
                }
            },
            _ => before,
        };

        let summary = RunSummary {
            started_at_ms,
            finished_at_ms: now_epoch_millis(),
            status: RunStatus::Completed,
            records_read: batch.len(),
            delivered: report.delivered(),
            failed: report.failed(),
            checkpoint_before: before,
            checkpoint_after: after,
            error: None,
        };
        info!(
            records = summary.records_read,
            delivered = summary.delivered,
            failed = summary.failed,
            checkpoint = ?after.map(|id| id.0),
            elapsed_ms = summary.finished_at_ms - started_at_ms,
            "export run completed"
        );
        self.journal(&summary).await;
        Ok(summary)
    }

    async fn abort(
        &self,
        started_at_ms: i64,
        checkpoint: Option<RecordId>,
        records_read: usize,
        e: &FerryError,
    ) {
        let summary = RunSummary {
            started_at_ms,
            finished_at_ms: now_epoch_millis(),
            status: RunStatus::Aborted,
            records_read,
            delivered: 0,
            failed: 0,
            checkpoint_before: checkpoint,
            checkpoint_after: checkpoint,
            error: Some(e.to_string()),
        };
        self.journal(&summary).await;
    }

    async fn journal(&self, summary: &RunSummary) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record_run(summary).await {
                warn!(error = %e, "failed to record run history");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ferry_core::{CheckpointPolicy, DeliveryFailure, Direction};
    use ferry_delivery::WorkerPool;
    use ferry_test_utils::{
        MemoryPreferenceStore, MemoryRunJournal, MockDelivery, MockSource, record,
    };

    struct Harness {
        source: MockSource,
        client: MockDelivery,
        prefs: MemoryPreferenceStore,
        journal: MemoryRunJournal,
        pipeline: ExportPipeline,
    }

    fn harness(records: Vec<ferry_core::Record>, policy: CheckpointPolicy) -> Harness {
        let source = MockSource::with_records(records);
        let client = MockDelivery::new();
        let prefs = MemoryPreferenceStore::new();
        let journal = MemoryRunJournal::new();
        let dispatcher = Dispatcher::new(
            Arc::new(client.clone()),
            WorkerPool::new(2, Duration::from_secs(5)),
            policy,
        );
        let pipeline = ExportPipeline::new(
            Arc::new(source.clone()),
            dispatcher,
            CheckpointStore::new(Arc::new(prefs.clone())),
            500,
        )
        .with_journal(Arc::new(journal.clone()));
        Harness {
            source,
            client,
            prefs,
            journal,
            pipeline,
        }
    }

    fn inbound(ids: &[i64]) -> Vec<ferry_core::Record> {
        ids.iter()
            .map(|&id| record(id, 1_000 + id, Direction::Inbound))
            .collect()
    }

    #[tokio::test]
    async fn first_run_delivers_everything_and_checkpoints_max() {
        let h = harness(inbound(&[1, 2, 3]), CheckpointPolicy::AdvancePastBatch);

        let summary = h.pipeline.run_once().await.unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.checkpoint_before, None);
        assert_eq!(summary.checkpoint_after, Some(RecordId(3)));
        assert_eq!(h.client.delivered_ids().await, [1, 2, 3]);
        assert_eq!(
            h.pipeline.checkpoints().load().await.unwrap(),
            Some(RecordId(3))
        );
    }

    #[tokio::test]
    async fn unchanged_store_yields_empty_run() {
        let h = harness(inbound(&[1, 2]), CheckpointPolicy::AdvancePastBatch);
        h.pipeline.run_once().await.unwrap();
        let writes = h.prefs.write_count();

        let summary = h.pipeline.run_once().await.unwrap();

        assert_eq!(summary.status, RunStatus::Empty);
        assert_eq!(summary.checkpoint_after, Some(RecordId(2)));
        assert_eq!(h.prefs.write_count(), writes);
        assert_eq!(h.client.attempts().await.len(), 2);
    }

    #[tokio::test]
    async fn store_failure_aborts_without_state_change() {
        let h = harness(inbound(&[1]), CheckpointPolicy::AdvancePastBatch);
        h.source.set_unavailable(true);

        let err = h.pipeline.run_once().await.unwrap_err();

        assert!(matches!(err, FerryError::StoreUnavailable { .. }));
        assert_eq!(h.prefs.write_count(), 0);
        assert!(h.client.attempts().await.is_empty());
        let runs = h.journal.runs().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Aborted);
        assert!(runs[0].error.is_some());
    }

    #[tokio::test]
    async fn failed_record_below_batch_max_is_not_redelivered() {
        let h = harness(inbound(&[1, 2, 3]), CheckpointPolicy::AdvancePastBatch);
        h.client
            .fail(2, DeliveryFailure::Network("reset by peer".into()))
            .await;

        let first = h.pipeline.run_once().await.unwrap();
        assert_eq!(first.failed, 1);
        assert_eq!(first.checkpoint_after, Some(RecordId(3)));

        let second = h.pipeline.run_once().await.unwrap();
        assert_eq!(second.status, RunStatus::Empty);
        let attempted: Vec<i64> = h.client.attempts().await.iter().map(|r| r.id.0).collect();
        assert_eq!(attempted.iter().filter(|&&id| id == 2).count(), 1);
    }

    #[tokio::test]
    async fn contiguous_policy_retries_from_first_failure() {
        let h = harness(inbound(&[1, 2, 3]), CheckpointPolicy::ContiguousSuccess);
        h.client
            .fail(2, DeliveryFailure::Network("reset by peer".into()))
            .await;

        let first = h.pipeline.run_once().await.unwrap();
        assert_eq!(first.checkpoint_after, Some(RecordId(1)));

        let second = h.pipeline.run_once().await.unwrap();
        assert_eq!(second.records_read, 2);
    }

    #[tokio::test]
    async fn checkpoint_write_failure_is_reported() {
        let h = harness(inbound(&[1]), CheckpointPolicy::AdvancePastBatch);
        h.prefs.fail_writes(true);

        let err = h.pipeline.run_once().await.unwrap_err();

        assert!(matches!(err, FerryError::Storage { .. }));
        assert_eq!(h.journal.runs().await[0].status, RunStatus::Aborted);
    }

    #[tokio::test]
    async fn checkpoint_is_monotonic_across_runs() {
        let h = harness(inbound(&[4, 5]), CheckpointPolicy::AdvancePastBatch);
        let mut last = None;
        for next in [6, 7, 8] {
            let summary = h.pipeline.run_once().await.unwrap();
            assert!(summary.checkpoint_after >= last);
            last = summary.checkpoint_after;
            h.source.push(record(next, 2_000 + next, Direction::Outbound)).await;
        }
        assert_eq!(last, Some(RecordId(7)));
    }
}
