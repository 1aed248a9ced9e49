// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Source of wall-clock time for alarms.
///
/// Monotonic timers stop while the host is suspended; alarms compare against
/// this clock instead so they still fire at their wall-clock time.
pub trait WallClock: Send + Sync {
    /// Epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// The system's real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_epoch_millis()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
