// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the local SQLite message store.
//!
//! The store follows the Android telephony layout: table `sms` with columns
//! `_id`, `address`, `body`, `date` (epoch milliseconds) and `type`.

use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{OpenFlags, params};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use ferry_config::model::SourceConfig;
use ferry_core::{
    Component, Direction, FerryError, HealthStatus, MessageSource, Record, RecordId,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

const READ_BATCH_SQL: &str = "SELECT _id, address, body, date, type
     FROM sms
     WHERE (?1 IS NULL OR _id > ?1) AND type IN (?2, ?3)
     ORDER BY date ASC, _id ASC
     LIMIT ?4";

fn unavailable<E>(e: E) -> FerryError
where
    E: std::error::Error + Send + Sync + 'static,
{
    FerryError::StoreUnavailable {
        source: Box::new(e),
    }
}

/// [`MessageSource`] over a SQLite message store, opened read-only.
///
/// The connection is opened lazily on the first read. A failed open leaves
/// the source unopened so the next activation tries again.
pub struct SqliteMessageSource {
    path: String,
    conn: OnceCell<tokio_rusqlite::Connection>,
}

impl SqliteMessageSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self::from_path(config.database_path.clone())
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&tokio_rusqlite::Connection, FerryError> {
        self.conn
            .get_or_try_init(|| async {
                let conn = tokio_rusqlite::Connection::open_with_flags(
                    &self.path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .await
                .map_err(unavailable)?;
                conn.call(|conn| -> Result<(), rusqlite::Error> {
                    conn.busy_timeout(BUSY_TIMEOUT)
                })
                .await
                .map_err(unavailable)?;
                debug!(path = %self.path, "message store opened read-only");
                Ok(conn)
            })
            .await
    }
}

#[async_trait]
impl Component for SqliteMessageSource {
    fn name(&self) -> &str {
        "sqlite-messages"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        match conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM sms LIMIT 1", [], |row| row.get(0))
            })
            .await
        {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl MessageSource for SqliteMessageSource {
    async fn read_batch(
        &self,
        after: Option<RecordId>,
        cap: usize,
    ) -> Result<Vec<Record>, FerryError> {
        if cap == 0 {
            return Ok(Vec::new());
        }
        let after = after.map(|id| id.0);
        let limit = i64::try_from(cap).unwrap_or(i64::MAX);

        let records = self
            .connection()
            .await?
            .call(move |conn| -> Result<Vec<Record>, rusqlite::Error> {
                let mut stmt = conn.prepare_cached(READ_BATCH_SQL)?;
                let rows = stmt.query_map(
                    params![after, Direction::INBOX_CODE, Direction::SENT_CODE, limit],
                    |row| {
                        let code: i64 = row.get(4)?;
                        Ok((
                            RecordId(row.get(0)?),
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, i64>(3)?,
                            code,
                        ))
                    },
                )?;

                let mut records = Vec::new();
                for row in rows {
                    let (id, address, body, timestamp, code) = row?;
                    let Some(direction) = Direction::from_code(code) else {
                        continue;
                    };
                    records.push(Record {
                        id,
                        address: address.unwrap_or_default(),
                        body: body.unwrap_or_default(),
                        timestamp,
                        direction,
                    });
                }
                Ok(records)
            })
            .await
            .map_err(|e| {
                warn!(path = %self.path, error = %e, "message store read failed");
                unavailable(e)
            })?;

        debug!(
            after = ?after,
            cap,
            read = records.len(),
            "read batch from message store"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_test_utils::MessageStoreFixture;

    const INBOX: i64 = 1;
    const SENT: i64 = 2;
    const DRAFT: i64 = 3;
    const FAILED: i64 = 5;

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r.id.0).collect()
    }

    #[tokio::test]
    async fn absent_checkpoint_reads_everything_in_timestamp_order() {
        let store = MessageStoreFixture::new();
        store.insert(1, "+100", "first", 1_000, INBOX);
        store.insert(2, "+200", "second", 2_000, SENT);
        store.insert(3, "+100", "third", 3_000, INBOX);

        let source = SqliteMessageSource::from_path(store.path_str());
        let batch = source.read_batch(None, 500).await.unwrap();

        assert_eq!(ids(&batch), [1, 2, 3]);
        assert_eq!(batch[1].direction, Direction::Outbound);
        assert_eq!(batch[1].body, "second");
        assert_eq!(batch[2].timestamp, 3_000);
    }

    #[tokio::test]
    async fn only_ids_above_checkpoint_are_returned() {
        let store = MessageStoreFixture::new();
        for id in 1..=6 {
            store.insert(id, "+100", "m", id * 10, INBOX);
        }

        let source = SqliteMessageSource::from_path(store.path_str());
        let batch = source.read_batch(Some(RecordId(4)), 500).await.unwrap();
        assert_eq!(ids(&batch), [5, 6]);
    }

    #[tokio::test]
    async fn drafts_and_failed_messages_are_excluded() {
        let store = MessageStoreFixture::new();
        store.insert(3, "+100", "sent", 1_000, SENT);
        store.insert(4, "+100", "unsent draft", 2_000, DRAFT);
        store.insert(5, "+100", "bounced", 3_000, FAILED);

        let source = SqliteMessageSource::from_path(store.path_str());
        assert!(source.read_batch(Some(RecordId(3)), 500).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_is_capped_and_ordered_by_timestamp() {
        let store = MessageStoreFixture::new();
        // Identifier order differs from clock order.
        store.insert(10, "+1", "a", 5_000, INBOX);
        store.insert(11, "+1", "b", 1_000, INBOX);
        store.insert(12, "+1", "c", 3_000, SENT);
        store.insert(13, "+1", "d", 4_000, INBOX);

        let source = SqliteMessageSource::from_path(store.path_str());
        let batch = source.read_batch(None, 3).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(ids(&batch), [11, 12, 13]);
        assert!(batch.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn null_address_and_body_read_as_empty() {
        let store = MessageStoreFixture::new();
        store.insert_raw(1, None, None, 1_000, INBOX);

        let source = SqliteMessageSource::from_path(store.path_str());
        let batch = source.read_batch(None, 10).await.unwrap();
        assert_eq!(batch[0].address, "");
        assert_eq!(batch[0].body, "");
    }

    #[tokio::test]
    async fn unchanged_store_and_checkpoint_yield_empty_batch() {
        let store = MessageStoreFixture::new();
        store.insert(1, "+1", "a", 1_000, INBOX);
        store.insert(2, "+1", "b", 2_000, SENT);

        let source = SqliteMessageSource::from_path(store.path_str());
        let first = source.read_batch(None, 10).await.unwrap();
        let checkpoint = first.iter().map(|r| r.id).max();
        assert!(source.read_batch(checkpoint, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_store_is_unavailable_then_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.db");
        let source = SqliteMessageSource::from_path(path.to_str().unwrap());

        let err = source.read_batch(None, 10).await.unwrap_err();
        assert!(matches!(err, FerryError::StoreUnavailable { .. }));

        let store = MessageStoreFixture::at(&path);
        store.insert(1, "+1", "hello", 1_000, INBOX);
        assert_eq!(ids(&source.read_batch(None, 10).await.unwrap()), [1]);
    }

    #[tokio::test]
    async fn missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        rusqlite::Connection::open(&path).unwrap();

        let source = SqliteMessageSource::from_path(path.to_str().unwrap());
        let err = source.read_batch(None, 10).await.unwrap_err();
        assert!(matches!(err, FerryError::StoreUnavailable { .. }));
        assert!(matches!(
            source.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn zero_cap_reads_nothing() {
        let store = MessageStoreFixture::new();
        store.insert(1, "+1", "a", 1_000, INBOX);
        let source = SqliteMessageSource::from_path(store.path_str());
        assert!(source.read_batch(None, 0).await.unwrap().is_empty());
    }
}
