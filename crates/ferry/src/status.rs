// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry status` command implementation.
//!
//! Reads the state database directly, so it works whether or not a
//! `ferry serve` process is running.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use ferry_agent::CheckpointStore;
use ferry_config::FerryConfig;
use ferry_core::{FerryError, RunJournal, RunStatus, RunSummary, WakePlan};
use ferry_scheduler::WakePlanStore;
use serde::Serialize;

use crate::serve::open_state;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub checkpoint: Option<i64>,
    pub next_trigger_ms: Option<i64>,
    pub next_trigger: Option<String>,
    pub interval_secs: Option<i64>,
    pub endpoint: String,
    pub recent_runs: Vec<RunSummary>,
}

impl StatusReport {
    fn new(
        checkpoint: Option<i64>,
        plan: Option<WakePlan>,
        endpoint: String,
        recent_runs: Vec<RunSummary>,
    ) -> Self {
        Self {
            checkpoint,
            next_trigger_ms: plan.map(|p| p.next_trigger_ms),
            next_trigger: plan.map(|p| format_instant(p.next_trigger_ms)),
            interval_secs: plan.map(|p| p.interval_ms / 1000),
            endpoint,
            recent_runs,
        }
    }
}

fn format_instant(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Run the `ferry status` command.
pub async fn run_status(
    config: &FerryConfig,
    json: bool,
    plain: bool,
    limit: usize,
) -> Result<(), FerryError> {
    let state = open_state(config).await?;
    let checkpoint = CheckpointStore::new(state.clone()).load().await?;
    let interval_ms = i64::try_from(config.schedule.interval().as_millis()).unwrap_or(i64::MAX);
    let plan = WakePlanStore::new(state.clone(), interval_ms).load().await?;
    let runs = state.recent_runs(limit).await?;
    state.close().await?;

    let report = StatusReport::new(
        checkpoint.map(|id| id.0),
        plan,
        config.delivery.endpoint_url.clone(),
        runs,
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
    Ok(())
}

fn status_label(status: RunStatus, use_color: bool) -> String {
    if !use_color {
        return status.to_string();
    }
    use colored::Colorize;
    match status {
        RunStatus::Completed => status.to_string().green().to_string(),
        RunStatus::Empty => status.to_string().dimmed().to_string(),
        RunStatus::Aborted => status.to_string().red().to_string(),
    }
}

fn print_report(report: &StatusReport, use_color: bool) {
    println!();
    println!("  ferry status");
    println!("  {}", "-".repeat(35));
    println!(
        "    Checkpoint: {}",
        report
            .checkpoint
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    match (&report.next_trigger, report.interval_secs) {
        (Some(next), Some(interval)) => {
            println!("    Next wake:  {next} (every {})", format_interval(interval))
        }
        _ => println!("    Next wake:  not scheduled"),
    }
    println!("    Endpoint:   {}", report.endpoint);
    println!();

    if report.recent_runs.is_empty() {
        println!("  No runs recorded yet.");
        println!();
        return;
    }

    println!("  Recent runs");
    println!("  {}", "-".repeat(35));
    for run in &report.recent_runs {
        let mut line = format!(
            "    {}  {:<9}  read {:>4}  ok {:>4}  failed {:>4}",
            format_instant(run.started_at_ms),
            status_label(run.status, use_color),
            run.records_read,
            run.delivered,
            run.failed,
        );
        if let Some(error) = &run.error {
            line.push_str(&format!("  ({error})"));
        }
        println!("{line}");
    }
    println!();
}

/// Format seconds into a human-readable interval.
fn format_interval(secs: i64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 && hours == 0 && minutes == 0 {
        format!("{days}d")
    } else if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
