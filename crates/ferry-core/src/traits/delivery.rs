// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-record delivery to the remote collector.

use async_trait::async_trait;

use crate::error::DeliveryFailure;
use crate::traits::adapter::Component;
use crate::types::Record;

/// Sends one record to the collector. Implementations must not retry.
#[async_trait]
pub trait DeliveryClient: Component {
    async fn send(&self, record: &Record) -> Result<(), DeliveryFailure>;
}
