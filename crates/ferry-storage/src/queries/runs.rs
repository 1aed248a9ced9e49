// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run-history rows.

use std::str::FromStr;

use ferry_core::{FerryError, RecordId};
use rusqlite::params;

use crate::database::Database;
use crate::models::{ExportRun, RunStatus, RunSummary};

/// Append a finished run. Returns the new row id.
pub async fn insert_run(db: &Database, summary: &RunSummary) -> Result<i64, FerryError> {
    let s = summary.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO export_runs (started_at, finished_at, status, records_read,
                     delivered, failed, checkpoint_before, checkpoint_after, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    s.started_at_ms,
                    s.finished_at_ms,
                    s.status.to_string(),
                    s.records_read as i64,
                    s.delivered as i64,
                    s.failed as i64,
                    s.checkpoint_before.map(|c| c.0),
                    s.checkpoint_after.map(|c| c.0),
                    s.error,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent runs, newest first.
pub async fn recent_runs(db: &Database, limit: usize) -> Result<Vec<ExportRun>, FerryError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, started_at, finished_at, status, records_read, delivered,
                        failed, checkpoint_before, checkpoint_after, error
                 FROM export_runs
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let status: String = row.get(3)?;
                let status = RunStatus::from_str(&status).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(ExportRun {
                    id: row.get(0)?,
                    summary: RunSummary {
                        started_at_ms: row.get(1)?,
                        finished_at_ms: row.get(2)?,
                        status,
                        records_read: row.get::<_, i64>(4)? as usize,
                        delivered: row.get::<_, i64>(5)? as usize,
                        failed: row.get::<_, i64>(6)? as usize,
                        checkpoint_before: row.get::<_, Option<i64>>(7)?.map(RecordId),
                        checkpoint_after: row.get::<_, Option<i64>>(8)?.map(RecordId),
                        error: row.get(9)?,
                    },
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
