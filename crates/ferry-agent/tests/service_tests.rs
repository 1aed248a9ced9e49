// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resident service tests with in-memory adapters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ferry_agent::{
    CheckpointStore, ExportPipeline, ExportService, Inbox, LifecycleRunner, Trigger,
};
use ferry_config::model::{LifecycleConfig, ScheduleConfig};
use ferry_core::{
    CheckpointPolicy, Component, Direction, FerryError, HealthStatus, PreferenceStore, RecordId,
};
use ferry_delivery::{Dispatcher, WorkerPool};
use ferry_scheduler::{WakeScheduler, WakeSignal};
use ferry_storage::models::{ALARM_NAMESPACE, NEXT_TRIGGER_KEY};
use ferry_test_utils::{
    MemoryPreferenceStore, MemoryRunJournal, MockAlarmService, MockDelivery, MockSource,
    RecordingLiveness, record,
};

/// Preference store that panics on its first alarm-plan read once armed.
#[derive(Clone, Default)]
struct PanicOnce {
    inner: MemoryPreferenceStore,
    armed: Arc<AtomicBool>,
}

#[async_trait]
impl Component for PanicOnce {
    fn name(&self) -> &str {
        "panic-once"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PreferenceStore for PanicOnce {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, FerryError> {
        if namespace == ALARM_NAMESPACE && self.armed.swap(false, Ordering::SeqCst) {
            panic!("preference store corrupted");
        }
        self.inner.get(namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), FerryError> {
        self.inner.put(namespace, key, value).await
    }

    async fn put_max(&self, namespace: &str, key: &str, value: i64) -> Result<i64, FerryError> {
        self.inner.put_max(namespace, key, value).await
    }
}

struct Fixture {
    prefs: PanicOnce,
    alarms: MockAlarmService,
    liveness: RecordingLiveness,
    journal: MemoryRunJournal,
    client: MockDelivery,
    checkpoints: CheckpointStore,
    wake_tx: mpsc::Sender<WakeSignal>,
    service: ExportService,
    inbox: Inbox,
}

fn fixture(run_on_start: bool) -> Fixture {
    let prefs = PanicOnce::default();
    let source = MockSource::with_records(
        (1..=3)
            .map(|id| record(id, 1_000 * id, Direction::Outbound))
            .collect(),
    );
    let client = MockDelivery::new();
    let alarms = MockAlarmService::new();
    let liveness = RecordingLiveness::new();
    let journal = MemoryRunJournal::new();
    let checkpoints = CheckpointStore::new(Arc::new(prefs.clone()));

    let pipeline = ExportPipeline::new(
        Arc::new(source),
        Dispatcher::new(
            Arc::new(client.clone()),
            WorkerPool::new(2, Duration::from_secs(5)),
            CheckpointPolicy::AdvancePastBatch,
        ),
        checkpoints.clone(),
        500,
    )
    .with_journal(Arc::new(journal.clone()));

    let schedule = ScheduleConfig {
        run_on_start,
        ..ScheduleConfig::default()
    };
    let lifecycle = LifecycleConfig {
        restart_backoff_secs: 0,
        drain_timeout_secs: 5,
        ..LifecycleConfig::default()
    };

    let (request_tx, requests) = mpsc::channel(8);
    let (wake_tx, wakes) = mpsc::channel(8);
    let runner = Arc::new(LifecycleRunner::new(
        Arc::new(pipeline),
        Arc::new(liveness.clone()),
        &lifecycle,
        request_tx,
    ));
    let scheduler = Arc::new(WakeScheduler::new(
        Arc::new(alarms.clone()),
        Arc::new(prefs.clone()),
        &schedule,
    ));
    let service = ExportService::new(runner, scheduler, &schedule, &lifecycle);

    Fixture {
        prefs,
        alarms,
        liveness,
        journal,
        client,
        checkpoints,
        wake_tx,
        service,
        inbox: Inbox { wakes, requests },
    }
}

async fn wait_for_checkpoint(checkpoints: &CheckpointStore, expected: RecordId) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if checkpoints.load().await.ok().flatten() == Some(expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("checkpoint should reach expected value");
}

#[tokio::test]
async fn startup_scan_runs_and_shutdown_cancels_alarms() {
    let f = fixture(true);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(f.service.run(f.inbox, cancel.clone()));

    wait_for_checkpoint(&f.checkpoints, RecordId(3)).await;
    assert_eq!(f.alarms.live_count().await, 2);

    cancel.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(f.alarms.live_count().await, 0);
    assert_eq!(f.client.delivered_ids().await, [1, 2, 3]);
    assert_eq!(f.liveness.withdrawals().await, 1);
    assert!(
        f.prefs
            .inner
            .snapshot(ALARM_NAMESPACE, NEXT_TRIGGER_KEY)
            .await
            .is_some(),
        "wake plan survives shutdown"
    );
}

#[tokio::test]
async fn wake_signal_triggers_scan() {
    let f = fixture(false);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(f.service.run(f.inbox, cancel.clone()));

    f.wake_tx
        .send(WakeSignal {
            key: ferry_core::AlarmKey::new("ferry.export", 0),
            scheduled_ms: 0,
        })
        .await
        .unwrap();

    wait_for_checkpoint(&f.checkpoints, RecordId(3)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let runs = f.journal.runs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].delivered, 3);
}

#[tokio::test]
async fn panicking_loop_is_restarted_and_reactivates() {
    let f = fixture(false);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(f.service.run(f.inbox, cancel.clone()));

    // Give recovery a moment to read the plan before the store turns hostile.
    tokio::time::timeout(Duration::from_secs(5), async {
        while f.alarms.live_count().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    f.prefs.armed.store(true, Ordering::SeqCst);

    f.wake_tx
        .send(WakeSignal {
            key: ferry_core::AlarmKey::new("ferry.export", 1),
            scheduled_ms: 0,
        })
        .await
        .unwrap();

    wait_for_checkpoint(&f.checkpoints, RecordId(3)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn manual_request_is_served() {
    let f = fixture(false);
    let cancel = CancellationToken::new();
    let Inbox { wakes, requests } = f.inbox;
    let (manual_tx, manual_rx) = mpsc::channel(1);
    drop(requests);
    let inbox = Inbox {
        wakes,
        requests: manual_rx,
    };
    let handle = tokio::spawn(f.service.run(inbox, cancel.clone()));

    manual_tx.send(Trigger::Manual).await.unwrap();
    wait_for_checkpoint(&f.checkpoints, RecordId(3)).await;

    cancel.cancel();
    handle.await.unwrap().unwrap();
}
