// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the pipeline's pluggable components.

use async_trait::async_trait;

use crate::error::FerryError;
use crate::types::HealthStatus;

/// Identity and health for every pluggable component (source, store, delivery).
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns the human-readable name of this component instance.
    fn name(&self) -> &str;

    /// Performs a health check and returns the component's current status.
    async fn health_check(&self) -> Result<HealthStatus, FerryError>;
}
