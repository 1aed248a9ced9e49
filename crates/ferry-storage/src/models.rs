// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preference namespaces and keys, and row mappings for stored entities.

pub use ferry_core::types::{RunStatus, RunSummary};

/// Namespace holding the export checkpoint.
pub const EXPORT_NAMESPACE: &str = "export_prefs";
/// Highest record identifier processed.
pub const LAST_PROCESSED_KEY: &str = "last_processed_id";

/// Namespace holding the wake plan.
pub const ALARM_NAMESPACE: &str = "alarm_prefs";
/// Next planned trigger, epoch milliseconds.
pub const NEXT_TRIGGER_KEY: &str = "next_trigger_time";
/// Cadence interval, milliseconds.
pub const INTERVAL_KEY: &str = "interval_ms";

/// A run-history row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRun {
    pub id: i64,
    pub summary: RunSummary,
}
