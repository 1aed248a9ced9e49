// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline and its external collaborators.
//!
//! Components extend [`Component`] and use `#[async_trait]` for dynamic
//! dispatch compatibility.

pub mod adapter;
pub mod alarm;
pub mod delivery;
pub mod journal;
pub mod liveness;
pub mod preferences;
pub mod source;

pub use adapter::Component;
pub use alarm::AlarmService;
pub use delivery::DeliveryClient;
pub use journal::RunJournal;
pub use liveness::{HostLiveness, LivenessNotice};
pub use preferences::PreferenceStore;
pub use source::MessageSource;
