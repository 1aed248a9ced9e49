// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wake scheduling for the Ferry export pipeline.
//!
//! [`WakeScheduler`] owns the persisted [`WakePlan`](ferry_core::WakePlan) and
//! the two alarm registrations. [`TokioAlarmService`] is the in-process alarm
//! backend used by the resident service; any [`AlarmService`](ferry_core::AlarmService)
//! implementation can stand in for it.

pub mod clock;
pub mod plan;
pub mod scheduler;
pub mod timer;

pub use clock::{SystemClock, WallClock, now_epoch_millis};
pub use plan::WakePlanStore;
pub use scheduler::{
    BOOTSTRAP_SECONDARY, CADENCE_SECONDARY, Recovery, WakeScheduler, cold_start_plan,
};
pub use timer::{TokioAlarmService, WakeSignal};
