// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespaced preference reads and writes.

use ferry_core::FerryError;
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;

/// Read one preference value.
pub async fn get(db: &Database, namespace: &str, key: &str) -> Result<Option<String>, FerryError> {
    let namespace = namespace.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or replace one preference value.
pub async fn put(db: &Database, namespace: &str, key: &str, value: &str) -> Result<(), FerryError> {
    let namespace = namespace.to_string();
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO preferences (namespace, key, value, updated_at)
                 VALUES (?1, ?2, ?3, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
                 ON CONFLICT(namespace, key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![namespace, key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Raise an integer preference to `value`; a larger stored value wins.
///
/// The comparison runs inside SQLite, so concurrent writers (including other
/// processes on the same file) can never lower the stored value.
pub async fn put_max(
    db: &Database,
    namespace: &str,
    key: &str,
    value: i64,
) -> Result<i64, FerryError> {
    let namespace = namespace.to_string();
    let key = key.to_string();
    let stored: String = db
        .connection()
        .call(move |conn| -> Result<String, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO preferences (namespace, key, value, updated_at)
                 VALUES (?1, ?2, ?3, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
                 ON CONFLICT(namespace, key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at
                 WHERE CAST(preferences.value AS INTEGER) < CAST(excluded.value AS INTEGER)",
                params![namespace, key, value.to_string()],
            )?;
            let stored = tx.query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    stored.trim().parse().map_err(|e| FerryError::Storage {
        source: format!("stored value {stored:?} is not an integer: {e}").into(),
    })
}
