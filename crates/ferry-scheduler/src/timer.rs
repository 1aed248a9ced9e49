// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process alarm service built on tokio timers.
//!
//! Each registration is a spawned task that sleeps until its trigger and then
//! sends a [`WakeSignal`]. Registrations are keyed by [`AlarmKey`]; arming a
//! key that is already armed cancels the old task first.
//!
//! Sleeps are cut into slices of at most [`MAX_SLEEP_SLICE`] and the
//! [`WallClock`] is re-read after each one, so an alarm fires at most one
//! slice late even when the host was suspended in between.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ferry_core::{AlarmKey, AlarmService, FerryError};

use crate::clock::{SystemClock, WallClock};

/// Longest single monotonic sleep before the wall clock is checked again.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_secs(60);

/// Sent when an alarm fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeSignal {
    pub key: AlarmKey,
    /// Wall-clock time the alarm was armed for, epoch milliseconds.
    pub scheduled_ms: i64,
}

struct Registration {
    generation: u64,
    token: CancellationToken,
}

type Registrations = Arc<Mutex<HashMap<AlarmKey, Registration>>>;

fn lock(registrations: &Registrations) -> MutexGuard<'_, HashMap<AlarmKey, Registration>> {
    registrations.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Alarm service whose alarms live as long as the process.
///
/// A signal is dropped when the receiver is busy, which matches a host that
/// would deliver the trigger to a runner already scanning.
#[derive(Clone)]
pub struct TokioAlarmService {
    tx: mpsc::Sender<WakeSignal>,
    registrations: Registrations,
    generations: Arc<AtomicU64>,
    clock: Arc<dyn WallClock>,
}

impl TokioAlarmService {
    pub fn new(tx: mpsc::Sender<WakeSignal>) -> Self {
        Self::with_clock(tx, Arc::new(SystemClock))
    }

    pub fn with_clock(tx: mpsc::Sender<WakeSignal>, clock: Arc<dyn WallClock>) -> Self {
        Self {
            tx,
            registrations: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Create a service together with the receiving end of its wake channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WakeSignal>) {
        Self::channel_with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn channel_with_clock(
        capacity: usize,
        clock: Arc<dyn WallClock>,
    ) -> (Self, mpsc::Receiver<WakeSignal>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::with_clock(tx, clock), rx)
    }

    /// Number of live registrations.
    pub fn armed(&self) -> usize {
        lock(&self.registrations).len()
    }

    /// Cancel every registration.
    pub fn cancel_all(&self) {
        let drained: Vec<(AlarmKey, Registration)> = lock(&self.registrations).drain().collect();
        for (key, registration) in drained {
            registration.token.cancel();
            debug!(alarm = %key, "alarm cancelled");
        }
    }

    fn replace(&self, key: &AlarmKey) -> Result<(u64, CancellationToken), FerryError> {
        if self.tx.is_closed() {
            return Err(FerryError::SchedulerUnavailable {
                message: "wake channel is closed".to_string(),
            });
        }
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let registration = Registration {
            generation,
            token: token.clone(),
        };
        if let Some(previous) = lock(&self.registrations).insert(key.clone(), registration) {
            previous.token.cancel();
            debug!(alarm = %key, "replaced existing alarm");
        }
        Ok((generation, token))
    }
}

fn millis_until(clock: &dyn WallClock, at_ms: i64) -> i64 {
    at_ms.saturating_sub(clock.now_ms())
}

/// Resolves once `clock` reads at or after `at_ms`.
async fn wait_until(clock: &dyn WallClock, at_ms: i64) {
    loop {
        let remaining = millis_until(clock, at_ms);
        if remaining <= 0 {
            return;
        }
        let slice = Duration::from_millis(u64::try_from(remaining).unwrap_or(u64::MAX));
        tokio::time::sleep(slice.min(MAX_SLEEP_SLICE)).await;
    }
}

/// First cadence point after `now_ms` on the grid `anchor_ms + k * interval_ms`.
/// Points missed while the host was away are skipped, not replayed.
fn next_tick_after(anchor_ms: i64, interval_ms: i64, now_ms: i64) -> i64 {
    let next = anchor_ms.saturating_add(interval_ms);
    if next > now_ms {
        return next;
    }
    let missed = (now_ms - anchor_ms) / interval_ms;
    anchor_ms.saturating_add(missed.saturating_add(1).saturating_mul(interval_ms))
}

/// Returns false once the receiver is gone.
fn emit(tx: &mpsc::Sender<WakeSignal>, signal: WakeSignal) -> bool {
    match tx.try_send(signal) {
        Ok(()) => true,
        Err(TrySendError::Full(signal)) => {
            debug!(alarm = %signal.key, "wake dropped, receiver busy");
            true
        }
        Err(TrySendError::Closed(signal)) => {
            warn!(alarm = %signal.key, "wake channel closed, alarm stopped");
            false
        }
    }
}

#[async_trait]
impl AlarmService for TokioAlarmService {
    async fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), FerryError> {
        let (generation, token) = self.replace(key)?;
        let delay_secs = millis_until(self.clock.as_ref(), at_ms).max(0) / 1000;
        let tx = self.tx.clone();
        let registrations = self.registrations.clone();
        let clock = self.clock.clone();
        let key = key.clone();

        info!(alarm = %key, at_ms, delay_secs, "exact alarm armed");
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = wait_until(clock.as_ref(), at_ms) => {
                    {
                        let mut live = lock(&registrations);
                        if live.get(&key).is_some_and(|r| r.generation == generation) {
                            live.remove(&key);
                        }
                    }
                    emit(&tx, WakeSignal { key, scheduled_ms: at_ms });
                }
            }
        });
        Ok(())
    }

    async fn arm_repeating(
        &self,
        key: &AlarmKey,
        first_at_ms: i64,
        interval: Duration,
    ) -> Result<(), FerryError> {
        if interval.is_zero() {
            return Err(FerryError::SchedulerUnavailable {
                message: format!("repeating alarm {key} needs a non-zero interval"),
            });
        }
        let (_, token) = self.replace(key)?;
        let tx = self.tx.clone();
        let clock = self.clock.clone();
        let key = key.clone();
        let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1);

        info!(
            alarm = %key,
            first_at_ms,
            interval_secs = interval.as_secs(),
            "repeating alarm armed"
        );
        tokio::spawn(async move {
            let mut scheduled_ms = first_at_ms;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = wait_until(clock.as_ref(), scheduled_ms) => {
                        if !emit(&tx, WakeSignal { key: key.clone(), scheduled_ms }) {
                            break;
                        }
                        scheduled_ms = next_tick_after(scheduled_ms, interval_ms, clock.now_ms());
                    }
                }
            }
        });
        Ok(())
    }

    async fn cancel(&self, key: &AlarmKey) -> Result<(), FerryError> {
        if let Some(registration) = lock(&self.registrations).remove(key) {
            registration.token.cancel();
            debug!(alarm = %key, "alarm cancelled");
        }
        Ok(())
    }
}
