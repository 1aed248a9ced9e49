// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Ferry export pipeline.
//!
//! Two databases are involved. The local message store is opened read-only
//! through [`SqliteMessageSource`]. Ferry's own state (checkpoint, wake plan,
//! run history) lives in a WAL-mode database with embedded migrations,
//! written through a single `tokio-rusqlite` connection.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod source;

pub use adapter::SqliteStateStore;
pub use database::Database;
pub use models::*;
pub use source::SqliteMessageSource;
