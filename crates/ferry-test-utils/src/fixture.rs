// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Throwaway SQLite message store with the telephony `sms` layout.

use std::path::{Path, PathBuf};

use ferry_core::Record;
use rusqlite::{Connection, params};
use tempfile::TempDir;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sms (
    _id     INTEGER PRIMARY KEY,
    address TEXT,
    body    TEXT,
    date    INTEGER NOT NULL,
    type    INTEGER NOT NULL
)";

/// A writable message store for tests. The reader under test opens it read-only.
pub struct MessageStoreFixture {
    _dir: Option<TempDir>,
    path: PathBuf,
    conn: Connection,
}

impl MessageStoreFixture {
    /// Create a store in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("messages.db");
        let mut fixture = Self::at(&path);
        fixture._dir = Some(dir);
        fixture
    }

    /// Create (or reuse) a store at an explicit path.
    pub fn at(path: &Path) -> Self {
        let conn = Connection::open(path).expect("open fixture store");
        conn.execute_batch(SCHEMA).expect("create sms table");
        Self {
            _dir: None,
            path: path.to_path_buf(),
            conn,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().expect("utf-8 temp path")
    }

    /// Insert one row. `type_code` uses the store's codes (1 inbox, 2 sent, 3 draft, ...).
    pub fn insert(&self, id: i64, address: &str, body: &str, date: i64, type_code: i64) {
        self.insert_raw(id, Some(address), Some(body), date, type_code);
    }

    /// Insert one row allowing NULL address or body.
    pub fn insert_raw(
        &self,
        id: i64,
        address: Option<&str>,
        body: Option<&str>,
        date: i64,
        type_code: i64,
    ) {
        self.conn
            .execute(
                "INSERT INTO sms (_id, address, body, date, type) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, address, body, date, type_code],
            )
            .expect("insert sms row");
    }

    /// Insert a domain record using its direction's store code.
    pub fn insert_record(&self, record: &Record) {
        self.insert(
            record.id.0,
            &record.address,
            &record.body,
            record.timestamp,
            record.direction.code(),
        );
    }

    /// Drop the table so reads fail, simulating a broken store.
    pub fn break_schema(&self) {
        self.conn
            .execute_batch("DROP TABLE sms")
            .expect("drop sms table");
    }
}

impl Default for MessageStoreFixture {
    fn default() -> Self {
        Self::new()
    }
}
