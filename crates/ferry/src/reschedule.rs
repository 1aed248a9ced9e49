// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry reschedule`: replace the stored wake plan with a fresh cold start.
//!
//! Alarms live inside the `ferry serve` process, so the new plan takes effect
//! the next time the service starts and recovers it.

use ferry_config::FerryConfig;
use ferry_core::{FerryError, WakePlan};
use ferry_scheduler::{WakePlanStore, cold_start_plan, now_epoch_millis};

use crate::serve::open_state;

async fn persist_cold_start(config: &FerryConfig, now_ms: i64) -> Result<WakePlan, FerryError> {
    let state = open_state(config).await?;
    let plan = cold_start_plan(&config.schedule, now_ms);
    let saved = WakePlanStore::new(state.clone(), plan.interval_ms)
        .save(&plan)
        .await;
    state.close().await?;
    saved.map(|()| plan)
}

pub async fn run_reschedule(config: &FerryConfig) -> Result<(), FerryError> {
    let plan = persist_cold_start(config, now_epoch_millis()).await?;
    let next = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(plan.next_trigger_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| plan.next_trigger_ms.to_string());
    println!("ferry: next wake at {next}; restart `ferry serve` to apply");
    Ok(())
}
