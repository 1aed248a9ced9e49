// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase wake schedule with restart recovery.
//!
//! A cold start arms a one-shot bootstrap alarm at `now + initial_delay`,
//! persists that instant, and arms a repeating cadence alarm anchored at
//! `next + interval`. After a restart the persisted instant is honoured as
//! long as it still lies in the future; otherwise the schedule cold-starts.
//!
//! Alarm registration failures are logged and left alone. The persisted plan
//! is what makes the next restart re-arm correctly.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use ferry_config::model::ScheduleConfig;
use ferry_core::{AlarmKey, AlarmService, FerryError, PreferenceStore, WakePlan};

use crate::clock::now_epoch_millis;
use crate::plan::WakePlanStore;

/// Secondary key of the one-shot bootstrap alarm.
pub const BOOTSTRAP_SECONDARY: u32 = 0;
/// Secondary key of the repeating cadence alarm.
pub const CADENCE_SECONDARY: u32 = 1;

/// How [`WakeScheduler::recover_at`] arrived at the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// A stored future trigger was re-armed as-is.
    Resumed(WakePlan),
    /// No usable plan was stored; a fresh one was created.
    ColdStart(WakePlan),
}

impl Recovery {
    pub fn plan(&self) -> WakePlan {
        match self {
            Self::Resumed(plan) | Self::ColdStart(plan) => *plan,
        }
    }
}

pub struct WakeScheduler {
    alarms: Arc<dyn AlarmService>,
    plans: WakePlanStore,
    bootstrap: AlarmKey,
    cadence: AlarmKey,
    initial_delay_ms: i64,
    interval_ms: i64,
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// The plan a cold start at `now_ms` would persist under `config`.
pub fn cold_start_plan(config: &ScheduleConfig, now_ms: i64) -> WakePlan {
    WakePlan::cold_start(now_ms, millis(config.initial_delay()), millis(config.interval()))
}

impl WakeScheduler {
    pub fn new(
        alarms: Arc<dyn AlarmService>,
        prefs: Arc<dyn PreferenceStore>,
        config: &ScheduleConfig,
    ) -> Self {
        let interval_ms = millis(config.interval());
        Self {
            alarms,
            plans: WakePlanStore::new(prefs, interval_ms),
            bootstrap: AlarmKey::new(config.entrypoint.clone(), BOOTSTRAP_SECONDARY),
            cadence: AlarmKey::new(config.entrypoint.clone(), CADENCE_SECONDARY),
            initial_delay_ms: millis(config.initial_delay()),
            interval_ms,
        }
    }

    pub fn bootstrap_key(&self) -> &AlarmKey {
        &self.bootstrap
    }

    pub fn cadence_key(&self) -> &AlarmKey {
        &self.cadence
    }

    pub fn plans(&self) -> &WakePlanStore {
        &self.plans
    }

    pub async fn current_plan(&self) -> Result<Option<WakePlan>, FerryError> {
        self.plans.load().await
    }

    /// Discard any stored plan and schedule from `now_ms`.
    pub async fn schedule_cold_start_at(&self, now_ms: i64) -> Result<WakePlan, FerryError> {
        self.cancel_alarms().await;

        let plan = WakePlan::cold_start(now_ms, self.initial_delay_ms, self.interval_ms);
        self.arm_bootstrap(plan.next_trigger_ms).await;
        let persisted = self.plans.save(&plan).await;
        self.arm_cadence(&plan).await;

        persisted?;
        info!(
            next_trigger_ms = plan.next_trigger_ms,
            interval_ms = plan.interval_ms,
            "wake schedule cold-started"
        );
        Ok(plan)
    }

    pub async fn schedule_cold_start(&self) -> Result<WakePlan, FerryError> {
        self.schedule_cold_start_at(now_epoch_millis()).await
    }

    /// Re-arm from the stored plan if its trigger is still ahead of `now_ms`.
    pub async fn recover_at(&self, now_ms: i64) -> Result<Recovery, FerryError> {
        match self.plans.load().await? {
            Some(plan) if plan.is_pending_at(now_ms) => {
                self.arm_bootstrap(plan.next_trigger_ms).await;
                self.arm_cadence(&plan).await;
                info!(
                    next_trigger_ms = plan.next_trigger_ms,
                    "wake schedule resumed from stored plan"
                );
                Ok(Recovery::Resumed(plan))
            }
            stale => {
                if let Some(plan) = stale {
                    info!(
                        next_trigger_ms = plan.next_trigger_ms,
                        now_ms, "stored wake plan has passed"
                    );
                }
                self.schedule_cold_start_at(now_ms).await.map(Recovery::ColdStart)
            }
        }
    }

    pub async fn recover(&self) -> Result<Recovery, FerryError> {
        self.recover_at(now_epoch_millis()).await
    }

    /// Move the stored trigger to the next cadence point after a fire.
    ///
    /// Alarms are left as they are; the repeating alarm keeps its own period.
    pub async fn advance_after_fire_at(&self, now_ms: i64) -> Result<Option<WakePlan>, FerryError> {
        let Some(plan) = self.plans.load().await? else {
            return Ok(None);
        };
        let advanced = WakePlan {
            next_trigger_ms: plan.next_cadence_after(now_ms),
            ..plan
        };
        if advanced != plan {
            self.plans.save(&advanced).await?;
        }
        Ok(Some(advanced))
    }

    pub async fn advance_after_fire(&self) -> Result<Option<WakePlan>, FerryError> {
        self.advance_after_fire_at(now_epoch_millis()).await
    }

    /// Cancel both alarms. The stored plan is kept for the next recovery.
    pub async fn cancel_alarms(&self) {
        for key in [&self.bootstrap, &self.cadence] {
            if let Err(e) = self.alarms.cancel(key).await {
                warn!(alarm = %key, error = %e, "failed to cancel alarm");
            }
        }
    }

    async fn arm_bootstrap(&self, at_ms: i64) {
        if let Err(e) = self.alarms.arm_exact(&self.bootstrap, at_ms).await {
            warn!(alarm = %self.bootstrap, at_ms, error = %e, "failed to arm bootstrap alarm");
        }
    }

    async fn arm_cadence(&self, plan: &WakePlan) {
        let first_at_ms = plan.next_trigger_ms.saturating_add(plan.interval_ms);
        let interval = Duration::from_millis(u64::try_from(plan.interval_ms).unwrap_or(0));
        if let Err(e) = self
            .alarms
            .arm_repeating(&self.cadence, first_at_ms, interval)
            .await
        {
            warn!(alarm = %self.cadence, first_at_ms, error = %e, "failed to arm cadence alarm");
        }
    }
}
