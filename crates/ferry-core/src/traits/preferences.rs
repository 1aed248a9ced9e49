// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable namespaced key/value store.

use async_trait::async_trait;

use crate::error::FerryError;
use crate::traits::adapter::Component;

/// Scalar preferences grouped by namespace.
///
/// A successful write must be durable before it returns.
#[async_trait]
pub trait PreferenceStore: Component {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, FerryError>;

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), FerryError>;

    /// Store `value` unless the stored integer is already at least `value`,
    /// as one atomic step. Returns the integer stored afterwards.
    async fn put_max(&self, namespace: &str, key: &str, value: i64) -> Result<i64, FerryError>;
}
