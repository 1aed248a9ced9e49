// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host timer registrations used by the wake scheduler.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FerryError;
use crate::types::AlarmKey;

/// Timer service that fires the pipeline's entry point.
///
/// Registering a key that is already armed replaces the earlier
/// registration. Failures surface as [`FerryError::SchedulerUnavailable`].
#[async_trait]
pub trait AlarmService: Send + Sync + 'static {
    /// Arm a one-shot alarm that fires once at `at_ms` (epoch milliseconds).
    async fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), FerryError>;

    /// Arm a repeating alarm first firing at `first_at_ms`, then every `interval`.
    async fn arm_repeating(
        &self,
        key: &AlarmKey,
        first_at_ms: i64,
        interval: Duration,
    ) -> Result<(), FerryError>;

    /// Cancel the registration for `key`. Cancelling an unknown key is a no-op.
    async fn cancel(&self, key: &AlarmKey) -> Result<(), FerryError>;
}
