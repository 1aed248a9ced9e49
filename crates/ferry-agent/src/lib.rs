// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export pipeline and lifecycle management for Ferry.
//!
//! - [`ExportPipeline`] runs one scan: checkpoint, read, deliver, advance
//! - [`LifecycleRunner`] answers host activations with single-flight scans
//! - [`ExportService`] is the resident loop driven by wake alarms
//! - [`shutdown`] turns SIGINT/SIGTERM into a cancellation token

pub mod checkpoint;
pub mod lifecycle;
pub mod liveness;
pub mod pipeline;
pub mod service;
pub mod shutdown;
pub mod single_flight;

pub use checkpoint::CheckpointStore;
pub use lifecycle::{LifecycleRunner, Trigger};
pub use liveness::SystemdLiveness;
pub use pipeline::ExportPipeline;
pub use service::{ExportService, Inbox};
pub use single_flight::{FlightGuard, SingleFlight};
