// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alarm service that only records what was registered.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{AlarmKey, AlarmService, FerryError};

/// One live registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmRegistration {
    Exact { at_ms: i64 },
    Repeating { first_at_ms: i64, interval: Duration },
}

/// Records registrations keyed by [`AlarmKey`]. Clones share state.
#[derive(Clone, Default)]
pub struct MockAlarmService {
    live: Arc<Mutex<HashMap<AlarmKey, AlarmRegistration>>>,
    history: Arc<Mutex<Vec<(AlarmKey, Option<AlarmRegistration>)>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockAlarmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the host alarm service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current registration for `key`, if armed.
    pub async fn registration(&self, key: &AlarmKey) -> Option<AlarmRegistration> {
        self.live.lock().await.get(key).cloned()
    }

    /// Number of armed registrations.
    pub async fn live_count(&self) -> usize {
        self.live.lock().await.len()
    }

    /// Every arm (`Some`) and cancel (`None`) call, in order.
    pub async fn history(&self) -> Vec<(AlarmKey, Option<AlarmRegistration>)> {
        self.history.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), FerryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FerryError::SchedulerUnavailable {
                message: "alarm service offline".to_string(),
            });
        }
        Ok(())
    }

    async fn arm(&self, key: &AlarmKey, registration: AlarmRegistration) -> Result<(), FerryError> {
        self.check_available()?;
        self.live.lock().await.insert(key.clone(), registration.clone());
        self.history.lock().await.push((key.clone(), Some(registration)));
        Ok(())
    }
}

#[async_trait]
impl AlarmService for MockAlarmService {
    async fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), FerryError> {
        self.arm(key, AlarmRegistration::Exact { at_ms }).await
    }

    async fn arm_repeating(
        &self,
        key: &AlarmKey,
        first_at_ms: i64,
        interval: Duration,
    ) -> Result<(), FerryError> {
        self.arm(
            key,
            AlarmRegistration::Repeating {
                first_at_ms,
                interval,
            },
        )
        .await
    }

    async fn cancel(&self, key: &AlarmKey) -> Result<(), FerryError> {
        self.check_available()?;
        self.live.lock().await.remove(key);
        self.history.lock().await.push((key.clone(), None));
        Ok(())
    }
}
