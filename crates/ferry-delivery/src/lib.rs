// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery for the Ferry export pipeline.
//!
//! - [`HttpDeliveryClient`] POSTs one record per request to the collector
//! - [`WorkerPool`] runs a batch with bounded parallelism and per-record timeouts
//! - [`Dispatcher`] ties the two to a [`CheckpointPolicy`](ferry_core::CheckpointPolicy)

pub mod dispatcher;
pub mod http;
pub mod pool;

pub use dispatcher::{BatchReport, Dispatcher};
pub use http::HttpDeliveryClient;
pub use pool::WorkerPool;
