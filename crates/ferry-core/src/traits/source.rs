// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read boundary of the local message store.

use async_trait::async_trait;

use crate::error::FerryError;
use crate::traits::adapter::Component;
use crate::types::{Record, RecordId};

/// Read-only access to the local message store.
#[async_trait]
pub trait MessageSource: Component {
    /// Read up to `cap` records with identifier strictly greater than `after`.
    ///
    /// Only inbound and outbound records are returned, ordered by timestamp
    /// ascending. `after = None` applies no lower bound. An empty vector is
    /// not an error. A store failure maps to [`FerryError::StoreUnavailable`].
    async fn read_batch(
        &self,
        after: Option<RecordId>,
        cap: usize,
    ) -> Result<Vec<Record>, FerryError>;
}
