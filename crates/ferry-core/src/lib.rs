// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ferry export pipeline.
//!
//! This crate provides the error types, domain types, checkpoint policy and
//! the trait seams (message source, preferences, delivery, alarms, host
//! liveness) used throughout the Ferry workspace.

pub mod error;
pub mod policy;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DeliveryFailure, FerryError};
pub use policy::CheckpointPolicy;
pub use types::{
    AlarmKey, DeliveryOutcome, Direction, Disposition, HealthStatus, LifecycleMode,
    PayloadEncoding, Record, RecordId, RecordOutcome, RunStatus, RunSummary, WakePlan,
};

pub use traits::{
    AlarmService, Component, DeliveryClient, HostLiveness, LivenessNotice, MessageSource,
    PreferenceStore, RunJournal,
};
