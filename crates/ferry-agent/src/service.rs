// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resident export service.
//!
//! Recovers the wake schedule, optionally scans once at startup, then turns
//! every wake signal and reactivation request into an activation until the
//! cancellation token fires. The event loop runs in its own task under a
//! supervisor: if it panics it is restarted after a backoff and the runner
//! requests a fresh activation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ferry_config::model::{LifecycleConfig, ScheduleConfig};
use ferry_core::FerryError;
use ferry_scheduler::{Recovery, WakeScheduler, WakeSignal};

use crate::lifecycle::{LifecycleRunner, Trigger};

/// Receiving ends the event loop reads from.
pub struct Inbox {
    pub wakes: mpsc::Receiver<WakeSignal>,
    pub requests: mpsc::Receiver<Trigger>,
}

pub struct ExportService {
    runner: Arc<LifecycleRunner>,
    scheduler: Arc<WakeScheduler>,
    run_on_start: bool,
    restart_backoff: Duration,
    drain_timeout: Duration,
}

impl ExportService {
    pub fn new(
        runner: Arc<LifecycleRunner>,
        scheduler: Arc<WakeScheduler>,
        schedule: &ScheduleConfig,
        lifecycle: &LifecycleConfig,
    ) -> Self {
        Self {
            runner,
            scheduler,
            run_on_start: schedule.run_on_start,
            restart_backoff: lifecycle.restart_backoff(),
            drain_timeout: lifecycle.drain_timeout(),
        }
    }

    /// Run until `cancel` fires or both inbox channels close.
    pub async fn run(self, inbox: Inbox, cancel: CancellationToken) -> Result<(), FerryError> {
        match self.scheduler.recover().await {
            Ok(Recovery::Resumed(plan)) => {
                info!(next_trigger_ms = plan.next_trigger_ms, "resuming stored wake plan")
            }
            Ok(Recovery::ColdStart(plan)) => {
                info!(next_trigger_ms = plan.next_trigger_ms, "wake plan created")
            }
            Err(e) => error!(error = %e, "failed to recover wake schedule"),
        }

        if self.run_on_start {
            self.runner.on_activate(Trigger::Startup).await;
        }

        let inbox = Arc::new(Mutex::new(inbox));
        let mut restarts: u32 = 0;
        loop {
            let handle = tokio::spawn(event_loop(
                self.runner.clone(),
                self.scheduler.clone(),
                inbox.clone(),
                cancel.clone(),
            ));

            match handle.await {
                Ok(()) => break,
                Err(e) if e.is_panic() => {
                    restarts += 1;
                    error!(
                        restarts,
                        backoff_secs = self.restart_backoff.as_secs(),
                        "export service loop panicked, restarting"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.restart_backoff) => {}
                    }
                    self.runner.on_task_removed();
                }
                Err(e) => {
                    error!(error = %e, "export service loop was cancelled");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&self) {
        info!("export service stopping");
        self.scheduler.cancel_alarms().await;
        if self.runner.drain(self.drain_timeout).await {
            info!("export service stopped cleanly");
        }
        self.runner.withdraw().await;
    }
}

async fn event_loop(
    runner: Arc<LifecycleRunner>,
    scheduler: Arc<WakeScheduler>,
    inbox: Arc<Mutex<Inbox>>,
    cancel: CancellationToken,
) {
    let mut inbox = inbox.lock().await;
    let Inbox { wakes, requests } = &mut *inbox;
    let mut wakes_open = true;
    let mut requests_open = true;

    while wakes_open || requests_open {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown signal received, stopping export service");
                return;
            }
            signal = wakes.recv(), if wakes_open => match signal {
                Some(signal) => {
                    info!(alarm = %signal.key, scheduled_ms = signal.scheduled_ms, "wake alarm fired");
                    if let Err(e) = scheduler.advance_after_fire().await {
                        warn!(error = %e, "failed to advance wake plan");
                    }
                    runner.on_activate(Trigger::Alarm(signal.key)).await;
                }
                None => wakes_open = false,
            },
            request = requests.recv(), if requests_open => match request {
                Some(trigger) => {
                    runner.on_activate(trigger).await;
                }
                None => requests_open = false,
            },
        }
    }
    warn!("wake and request channels closed, export service exiting");
}
