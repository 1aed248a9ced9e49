// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ferry integration tests.
//!
//! Provides in-memory and scripted implementations of the core traits, plus a
//! throwaway SQLite message store, for fast deterministic tests without a
//! device or a network.
//!
//! # Components
//!
//! - [`MockDelivery`] - scripted delivery client with concurrency tracking
//! - [`MockSource`] - in-memory message source that counts reads
//! - [`MockAlarmService`] - records alarm registrations
//! - [`RecordingLiveness`] - records liveness announcements
//! - [`MemoryPreferenceStore`] / [`MemoryRunJournal`] - in-memory state
//! - [`MessageStoreFixture`] - SQLite file with the `sms` table

pub mod fixture;
pub mod memory;
pub mod mock_alarm;
pub mod mock_delivery;
pub mod mock_liveness;
pub mod mock_source;

pub use fixture::MessageStoreFixture;
pub use memory::{MemoryPreferenceStore, MemoryRunJournal};
pub use mock_alarm::{AlarmRegistration, MockAlarmService};
pub use mock_delivery::MockDelivery;
pub use mock_liveness::RecordingLiveness;
pub use mock_source::MockSource;

use ferry_core::{Direction, Record, RecordId};

/// Build a record with a readable body, for tests that don't care about content.
pub fn record(id: i64, timestamp: i64, direction: Direction) -> Record {
    Record {
        id: RecordId(id),
        address: format!("+1555{id:07}"),
        body: format!("message {id}"),
        timestamp,
        direction,
    }
}
