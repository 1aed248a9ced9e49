// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the reader, dispatcher, scheduler and lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DeliveryFailure;

/// Identifier assigned by the source store. Totally ordered and monotonic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// Direction of a message relative to the device that owns the store.
///
/// Display/serde produce the collector's wire value for the `type` field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Direction {
    #[strum(serialize = "received")]
    #[serde(rename = "received")]
    Inbound,
    #[strum(serialize = "sent")]
    #[serde(rename = "sent")]
    Outbound,
}

impl Direction {
    /// Store code for received messages.
    pub const INBOX_CODE: i64 = 1;
    /// Store code for sent messages.
    pub const SENT_CODE: i64 = 2;

    /// Map a store type code to a direction.
    ///
    /// Drafts (3), outbox (4), failed (5) and queued (6) return `None` and are
    /// never exported.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::INBOX_CODE => Some(Self::Inbound),
            Self::SENT_CODE => Some(Self::Outbound),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Inbound => Self::INBOX_CODE,
            Self::Outbound => Self::SENT_CODE,
        }
    }
}

/// One message read from the source store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub address: String,
    pub body: String,
    /// Milliseconds since the epoch, source store clock.
    pub timestamp: i64,
    pub direction: Direction,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    Failure(DeliveryFailure),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<Result<(), DeliveryFailure>> for DeliveryOutcome {
    fn from(result: Result<(), DeliveryFailure>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Outcome of one record within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub id: RecordId,
    pub outcome: DeliveryOutcome,
}

/// Persisted wake schedule.
///
/// `next_trigger_ms` is both the instant the bootstrap alarm is armed for and
/// the answer to "when should I next run" after an unplanned restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakePlan {
    pub next_trigger_ms: i64,
    pub interval_ms: i64,
}

impl WakePlan {
    /// Plan for a fresh schedule: first trigger `initial_delay_ms` after `now_ms`.
    pub fn cold_start(now_ms: i64, initial_delay_ms: i64, interval_ms: i64) -> Self {
        Self {
            next_trigger_ms: now_ms.saturating_add(initial_delay_ms),
            interval_ms,
        }
    }

    /// A plan is still usable only while its trigger lies strictly in the future.
    pub fn is_pending_at(&self, now_ms: i64) -> bool {
        self.next_trigger_ms > now_ms
    }

    /// First cadence point anchored at `next_trigger_ms` that lies strictly after `now_ms`.
    pub fn next_cadence_after(&self, now_ms: i64) -> i64 {
        if self.interval_ms <= 0 || now_ms < self.next_trigger_ms {
            return self.next_trigger_ms;
        }
        let elapsed = now_ms - self.next_trigger_ms;
        let periods = elapsed / self.interval_ms + 1;
        self.next_trigger_ms + periods * self.interval_ms
    }
}

/// Identity of one alarm registration. Re-arming the same key replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlarmKey {
    pub entrypoint: String,
    pub secondary: u32,
}

impl AlarmKey {
    pub fn new(entrypoint: impl Into<String>, secondary: u32) -> Self {
        Self {
            entrypoint: entrypoint.into(),
            secondary,
        }
    }
}

impl fmt::Display for AlarmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entrypoint, self.secondary)
    }
}

/// How a payload is encoded on the wire.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayloadEncoding {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `application/json`
    Json,
}

/// Whether the runner stays resident between wakes or exits after one scan.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleMode {
    #[default]
    Resident,
    OneShot,
}

/// What the host should do with the runner once an activation is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Keep the runner alive and restart it if it is killed.
    Sticky,
    /// Tear the runner down after the scan.
    NotSticky,
}

impl From<LifecycleMode> for Disposition {
    fn from(mode: LifecycleMode) -> Self {
        match mode {
            LifecycleMode::Resident => Self::Sticky,
            LifecycleMode::OneShot => Self::NotSticky,
        }
    }
}

/// Terminal state of one activation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// A non-empty batch was delivered and the checkpoint written.
    Completed,
    /// The store had nothing new.
    Empty,
    /// The activation stopped before the checkpoint could be written.
    Aborted,
}

/// Summary of one activation, appended to the run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
    pub status: RunStatus,
    pub records_read: usize,
    pub delivered: usize,
    pub failed: usize,
    pub checkpoint_before: Option<RecordId>,
    pub checkpoint_after: Option<RecordId>,
    pub error: Option<String>,
}

/// Health status reported by component health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is fully operational.
    Healthy,
    /// Component is operational but experiencing issues.
    Degraded(String),
    /// Component is not operational.
    Unhealthy(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn only_inbox_and_sent_codes_map_to_a_direction() {
        assert_eq!(Direction::from_code(1), Some(Direction::Inbound));
        assert_eq!(Direction::from_code(2), Some(Direction::Outbound));
        for excluded in [0, 3, 4, 5, 6, 7] {
            assert_eq!(Direction::from_code(excluded), None, "code {excluded}");
        }
    }

    #[test]
    fn direction_wire_names() {
        assert_eq!(Direction::Inbound.to_string(), "received");
        assert_eq!(Direction::Outbound.to_string(), "sent");
        assert_eq!(Direction::from_str("sent").unwrap(), Direction::Outbound);
        assert_eq!(
            serde_json::to_string(&Direction::Inbound).unwrap(),
            "\"received\""
        );
    }

    #[test]
    fn record_id_parses_persisted_text() {
        assert_eq!(RecordId::from_str("42").unwrap(), RecordId(42));
        assert_eq!(RecordId::from_str(" 7 ").unwrap(), RecordId(7));
        assert!(RecordId::from_str("seven").is_err());
    }

    #[test]
    fn wake_plan_pending_is_strictly_future() {
        let plan = WakePlan {
            next_trigger_ms: 1_000,
            interval_ms: 100,
        };
        assert!(plan.is_pending_at(999));
        assert!(!plan.is_pending_at(1_000));
        assert!(!plan.is_pending_at(1_001));
    }

    #[test]
    fn cold_start_offsets_from_now() {
        let plan = WakePlan::cold_start(1_000, 500, 86_400_000);
        assert_eq!(plan.next_trigger_ms, 1_500);
        assert_eq!(plan.interval_ms, 86_400_000);
    }

    #[test]
    fn next_cadence_after_steps_past_now() {
        let plan = WakePlan {
            next_trigger_ms: 1_000,
            interval_ms: 100,
        };
        assert_eq!(plan.next_cadence_after(500), 1_000);
        assert_eq!(plan.next_cadence_after(1_000), 1_100);
        assert_eq!(plan.next_cadence_after(1_050), 1_100);
        assert_eq!(plan.next_cadence_after(1_350), 1_400);
    }

    #[test]
    fn lifecycle_mode_maps_to_disposition() {
        assert_eq!(Disposition::from(LifecycleMode::Resident), Disposition::Sticky);
        assert_eq!(
            Disposition::from(LifecycleMode::OneShot),
            Disposition::NotSticky
        );
        assert_eq!(LifecycleMode::from_str("one_shot").unwrap(), LifecycleMode::OneShot);
    }

    #[test]
    fn outcome_from_result() {
        assert!(DeliveryOutcome::from(Ok(())).is_success());
        let failed = DeliveryOutcome::from(Err(DeliveryFailure::Network("down".into())));
        assert!(!failed.is_success());
    }
}
