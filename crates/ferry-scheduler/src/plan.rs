// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted wake plan in the `alarm_prefs` namespace.

use std::sync::Arc;

use tracing::warn;

use ferry_core::{FerryError, PreferenceStore, WakePlan};
use ferry_storage::models::{ALARM_NAMESPACE, INTERVAL_KEY, NEXT_TRIGGER_KEY};

/// Reads and writes the [`WakePlan`] through a [`PreferenceStore`].
#[derive(Clone)]
pub struct WakePlanStore {
    prefs: Arc<dyn PreferenceStore>,
    default_interval_ms: i64,
}

impl WakePlanStore {
    /// `default_interval_ms` is used when a stored plan predates the interval key.
    pub fn new(prefs: Arc<dyn PreferenceStore>, default_interval_ms: i64) -> Self {
        Self {
            prefs,
            default_interval_ms,
        }
    }

    /// Load the plan. A missing or unparseable trigger reads as no plan.
    pub async fn load(&self) -> Result<Option<WakePlan>, FerryError> {
        let Some(raw_next) = self.prefs.get(ALARM_NAMESPACE, NEXT_TRIGGER_KEY).await? else {
            return Ok(None);
        };
        let next_trigger_ms = match raw_next.trim().parse::<i64>() {
            Ok(value) => value,
            Err(e) => {
                warn!(value = %raw_next, error = %e, "ignoring unparseable wake plan");
                return Ok(None);
            }
        };

        let interval_ms = match self.prefs.get(ALARM_NAMESPACE, INTERVAL_KEY).await? {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|ms| *ms > 0)
                .unwrap_or(self.default_interval_ms),
            None => self.default_interval_ms,
        };

        Ok(Some(WakePlan {
            next_trigger_ms,
            interval_ms,
        }))
    }

    pub async fn save(&self, plan: &WakePlan) -> Result<(), FerryError> {
        self.prefs
            .put(
                ALARM_NAMESPACE,
                NEXT_TRIGGER_KEY,
                &plan.next_trigger_ms.to_string(),
            )
            .await?;
        self.prefs
            .put(ALARM_NAMESPACE, INTERVAL_KEY, &plan.interval_ms.to_string())
            .await
    }
}
