// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-facing activation callbacks.
//!
//! The [`LifecycleRunner`] is what a host (alarm, restart hook, CLI) talks to.
//! Activation never blocks on the scan: it announces liveness, starts the scan
//! on a tracked background task if none is running, and returns the
//! disposition straight away.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use ferry_config::model::LifecycleConfig;
use ferry_core::{AlarmKey, Disposition, HostLiveness, LifecycleMode, LivenessNotice};

use crate::pipeline::ExportPipeline;
use crate::single_flight::SingleFlight;

/// Why an activation happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Service start with `run_on_start`.
    Startup,
    /// A wake alarm fired.
    Alarm(AlarmKey),
    /// The runner asked to be activated again after being removed.
    Restart,
    /// Explicit request from an operator.
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::Alarm(key) => write!(f, "alarm:{key}"),
            Self::Restart => f.write_str("restart"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

pub struct LifecycleRunner {
    pipeline: Arc<ExportPipeline>,
    flight: SingleFlight,
    liveness: Arc<dyn HostLiveness>,
    notice: LivenessNotice,
    mode: LifecycleMode,
    requests: mpsc::Sender<Trigger>,
    tasks: TaskTracker,
}

impl LifecycleRunner {
    /// `requests` is where [`on_task_removed`](Self::on_task_removed) asks for reactivation.
    pub fn new(
        pipeline: Arc<ExportPipeline>,
        liveness: Arc<dyn HostLiveness>,
        config: &LifecycleConfig,
        requests: mpsc::Sender<Trigger>,
    ) -> Self {
        Self {
            pipeline,
            flight: SingleFlight::new(),
            liveness,
            notice: LivenessNotice {
                channel: config.notice_channel.clone(),
                title: config.notice_title.clone(),
                text: config.notice_text.clone(),
            },
            mode: config.mode,
            requests,
            tasks: TaskTracker::new(),
        }
    }

    pub fn mode(&self) -> LifecycleMode {
        self.mode
    }

    /// True while a scan holds the single-flight guard.
    pub fn is_scanning(&self) -> bool {
        self.flight.is_busy()
    }

    /// Handle one activation. Returns as soon as the scan has been started or skipped.
    pub async fn on_activate(&self, trigger: Trigger) -> Disposition {
        if let Err(e) = self.liveness.announce(&self.notice).await {
            warn!(error = %e, "failed to announce liveness");
        }

        let Some(guard) = self.flight.try_acquire() else {
            debug!(trigger = %trigger, "scan already running, activation dropped");
            return Disposition::from(self.mode);
        };

        info!(trigger = %trigger, "export scan started");
        let pipeline = self.pipeline.clone();
        let liveness = self.liveness.clone();
        let mode = self.mode;
        self.tasks.spawn(async move {
            let _guard = guard;
            if let Err(e) = pipeline.run_once().await {
                error!(trigger = %trigger, error = %e, "export scan aborted");
            }
            if mode == LifecycleMode::OneShot {
                if let Err(e) = liveness.withdraw().await {
                    warn!(error = %e, "failed to withdraw liveness");
                }
            }
        });

        Disposition::from(self.mode)
    }

    /// The host removed the runner from its task list; ask to be activated again.
    ///
    /// Returns false if the request could not be queued.
    pub fn on_task_removed(&self) -> bool {
        match self.requests.try_send(Trigger::Restart) {
            Ok(()) => {
                info!("runner removed, reactivation requested");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to request reactivation");
                false
            }
        }
    }

    /// Wait up to `timeout` for running scans. Returns true if all finished.
    pub async fn drain(&self, timeout: Duration) -> bool {
        if self.tasks.is_empty() {
            return true;
        }
        info!(count = self.tasks.len(), "waiting for running scan to finish");
        self.tasks.close();
        let drained = tokio::time::timeout(timeout, self.tasks.wait())
            .await
            .is_ok();
        self.tasks.reopen();
        if !drained {
            warn!(
                timeout_secs = timeout.as_secs(),
                "drain timeout reached, scan still running in the background"
            );
        }
        drained
    }

    pub async fn withdraw(&self) {
        if let Err(e) = self.liveness.withdraw().await {
            warn!(error = %e, "failed to withdraw liveness");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ferry_core::{CheckpointPolicy, Direction, RecordId};
    use ferry_delivery::{Dispatcher, WorkerPool};
    use ferry_test_utils::{
        MemoryPreferenceStore, MockDelivery, MockSource, RecordingLiveness, record,
    };

    use tracing_test::traced_test;

    use crate::checkpoint::CheckpointStore;

    struct Harness {
        source: MockSource,
        client: MockDelivery,
        prefs: MemoryPreferenceStore,
        liveness: RecordingLiveness,
        checkpoints: CheckpointStore,
        runner: LifecycleRunner,
        requests: mpsc::Receiver<Trigger>,
    }

    fn harness(client: MockDelivery, mode: LifecycleMode) -> Harness {
        let source = MockSource::with_records(
            (1..=3)
                .map(|id| record(id, 100 * id, Direction::Inbound))
                .collect(),
        );
        let prefs = MemoryPreferenceStore::new();
        let checkpoints = CheckpointStore::new(Arc::new(prefs.clone()));
        let pipeline = ExportPipeline::new(
            Arc::new(source.clone()),
            Dispatcher::new(
                Arc::new(client.clone()),
                WorkerPool::new(2, Duration::from_secs(5)),
                CheckpointPolicy::AdvancePastBatch,
            ),
            checkpoints.clone(),
            500,
        );
        let liveness = RecordingLiveness::new();
        let (tx, requests) = mpsc::channel(4);
        let config = LifecycleConfig {
            mode,
            ..LifecycleConfig::default()
        };
        let runner = LifecycleRunner::new(
            Arc::new(pipeline),
            Arc::new(liveness.clone()),
            &config,
            tx,
        );
        Harness {
            source,
            client,
            prefs,
            liveness,
            checkpoints,
            runner,
            requests,
        }
    }

    #[tokio::test]
    async fn activation_returns_before_scan_finishes() {
        let h = harness(MockDelivery::gated(), LifecycleMode::Resident);

        let disposition = h.runner.on_activate(Trigger::Manual).await;

        assert_eq!(disposition, Disposition::Sticky);
        assert_eq!(h.liveness.announcements().await.len(), 1);
        assert!(h.runner.is_scanning());

        h.client.open_gate();
        assert!(h.runner.drain(Duration::from_secs(5)).await);
        assert!(!h.runner.is_scanning());
        assert_eq!(h.checkpoints.load().await.unwrap(), Some(RecordId(3)));
    }

    #[tokio::test]
    async fn concurrent_activation_is_dropped() {
        let h = harness(MockDelivery::gated(), LifecycleMode::Resident);

        h.runner.on_activate(Trigger::Startup).await;
        h.runner
            .on_activate(Trigger::Alarm(AlarmKey::new("ferry.export", 0)))
            .await;

        h.client.open_gate();
        assert!(h.runner.drain(Duration::from_secs(5)).await);
        assert_eq!(h.source.read_count(), 1);
        assert_eq!(h.client.attempts().await.len(), 3);
        assert_eq!(h.prefs.write_count(), 1);
        assert_eq!(h.checkpoints.load().await.unwrap(), Some(RecordId(3)));
        assert_eq!(h.liveness.announcements().await.len(), 2);
    }

    #[tokio::test]
    async fn one_shot_withdraws_after_scan() {
        let h = harness(MockDelivery::new(), LifecycleMode::OneShot);

        assert_eq!(
            h.runner.on_activate(Trigger::Manual).await,
            Disposition::NotSticky
        );
        assert!(h.runner.drain(Duration::from_secs(5)).await);
        assert_eq!(h.liveness.withdrawals().await, 1);
    }

    #[tokio::test]
    async fn task_removal_requests_reactivation() {
        let mut h = harness(MockDelivery::new(), LifecycleMode::Resident);
        assert!(h.runner.on_task_removed());
        assert_eq!(h.requests.recv().await, Some(Trigger::Restart));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn drain_timeout_leaves_scan_running() {
        let h = harness(MockDelivery::gated(), LifecycleMode::Resident);
        h.runner.on_activate(Trigger::Manual).await;

        assert!(!h.runner.drain(Duration::from_secs(1)).await);
        assert!(logs_contain("scan still running in the background"));
        assert!(h.runner.is_scanning());

        h.client.open_gate();
        assert!(h.runner.drain(Duration::from_secs(5)).await);
        assert_eq!(h.checkpoints.load().await.unwrap(), Some(RecordId(3)));
    }

    #[test]
    fn trigger_display_names_the_alarm() {
        let trigger = Trigger::Alarm(AlarmKey::new("ferry.export", 1));
        assert_eq!(trigger.to_string(), "alarm:ferry.export#1");
    }
}
