// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint advancement rules applied after a batch has been delivered.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{RecordId, RecordOutcome};

/// Decides how far the checkpoint moves once every record in a batch has an outcome.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckpointPolicy {
    /// Advance to the highest identifier in the batch whatever the outcomes.
    ///
    /// A record that failed below that identifier is never re-read.
    #[default]
    AdvancePastBatch,

    /// Advance only through the leading run of successes in identifier order.
    ///
    /// Everything from the first failure upward is read again next run, so
    /// records after the failure may be delivered twice.
    ContiguousSuccess,
}

impl CheckpointPolicy {
    /// Compute the checkpoint to persist after a batch.
    ///
    /// The result is never lower than `current`; an empty batch leaves it unchanged.
    pub fn next_checkpoint(
        self,
        current: Option<RecordId>,
        outcomes: &[RecordOutcome],
    ) -> Option<RecordId> {
        let candidate = match self {
            Self::AdvancePastBatch => outcomes.iter().map(|o| o.id).max(),
            Self::ContiguousSuccess => {
                let mut ordered: Vec<&RecordOutcome> = outcomes.iter().collect();
                ordered.sort_by_key(|o| o.id);
                ordered
                    .iter()
                    .take_while(|o| o.outcome.is_success())
                    .map(|o| o.id)
                    .last()
            }
        };

        match (current, candidate) {
            (Some(cur), Some(next)) => Some(cur.max(next)),
            (cur, None) => cur,
            (None, next) => next,
        }
    }
}
