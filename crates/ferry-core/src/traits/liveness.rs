// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host liveness registration for the lifecycle runner.

use async_trait::async_trait;

use crate::error::FerryError;

/// Text shown to the host while the runner holds its keep-alive state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessNotice {
    pub channel: String,
    pub title: String,
    pub text: String,
}

/// Lets the runner tell the host it is doing work that should not be killed.
#[async_trait]
pub trait HostLiveness: Send + Sync + 'static {
    /// Announce the keep-alive notice. Called before any scan work starts.
    async fn announce(&self, notice: &LivenessNotice) -> Result<(), FerryError>;

    /// Withdraw the notice when the runner is torn down.
    async fn withdraw(&self) -> Result<(), FerryError>;
}
