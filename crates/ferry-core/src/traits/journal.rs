// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only history of activations.

use async_trait::async_trait;

use crate::error::FerryError;
use crate::types::RunSummary;

#[async_trait]
pub trait RunJournal: Send + Sync + 'static {
    /// Append a finished run and return its row id.
    async fn record_run(&self, summary: &RunSummary) -> Result<i64, FerryError>;

    /// Most recent runs, newest first.
    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>, FerryError>;
}
