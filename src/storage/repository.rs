//! Repository pattern for the post ledger
//!
//! The [`PostLedger`] trait decouples the scheduler from the storage
//! backend, keeping the pipeline testable against in-memory databases.
//! `record` is the sole write path, called exactly once per fired trigger
//! after the delivery pipeline reaches a terminal outcome. Submitter
//! retries happen before that point and never produce extra rows.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{DailyStats, PostAttempt, PostStatus, PostType};

/// Timestamp storage format (local wall-clock time)
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Date key storage format
const DATE_FMT: &str = "%Y-%m-%d";

/// Durable log of post attempts with per-day aggregates
///
/// Implementations must be safe under concurrent `record` calls: manual
/// test/post triggers can arrive while the scheduler loop is mid-firing.
pub trait PostLedger: Send + Sync {
    /// Persist one terminal attempt and update the day's counters as one unit
    ///
    /// Returns the assigned row id.
    fn record(&self, attempt: &PostAttempt) -> Result<i64>;

    /// Read the aggregate counters for a date
    fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats>;

    /// Rebuild a date's counters from its rows (rows are the source of truth)
    fn recompute_stats(&self, date: NaiveDate) -> Result<DailyStats>;

    /// Count attempts recorded on a date, optionally filtered by type
    fn count_for_day(&self, date: NaiveDate, post_type: Option<PostType>) -> Result<u32>;

    /// Timestamp of the most recent attempt on a date
    fn last_post_time(&self, date: NaiveDate) -> Result<Option<NaiveDateTime>>;

    /// Most recent attempts, newest first
    fn recent_attempts(&self, limit: usize) -> Result<Vec<PostAttempt>>;
}

/// SQLite implementation of [`PostLedger`]
///
/// Uses `Mutex<Connection>` for thread-safety and WAL mode so the
/// scheduler loop and manual triggers can write concurrently.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the ledger at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite ledger initialized");
        Ok(ledger)
    }

    /// Create in-memory ledger (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.create_schema()?;
        Ok(ledger)
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_type TEXT NOT NULL,
                    planned_at TEXT NOT NULL,
                    executed_at TEXT NOT NULL,
                    status TEXT NOT NULL,
                    source_used TEXT,
                    content TEXT,
                    error_message TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_posts_executed_at
                    ON posts(executed_at);

                CREATE INDEX IF NOT EXISTS idx_posts_type
                    ON posts(post_type);

                CREATE TABLE IF NOT EXISTS daily_stats (
                    date TEXT PRIMARY KEY,
                    total_posts INTEGER NOT NULL DEFAULT 0,
                    successful_posts INTEGER NOT NULL DEFAULT 0,
                    failed_posts INTEGER NOT NULL DEFAULT 0,
                    scheduled_posts INTEGER NOT NULL DEFAULT 0,
                    random_posts INTEGER NOT NULL DEFAULT 0
                );
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }
}

fn row_to_attempt(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostAttempt> {
    let parse_ts = |idx: usize| -> rusqlite::Result<NaiveDateTime> {
        let raw: String = row.get(idx)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FMT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    };

    let post_type: String = row.get(1)?;
    let status: String = row.get(4)?;

    Ok(PostAttempt {
        id: Some(row.get(0)?),
        post_type: post_type.parse().unwrap_or(PostType::Test),
        planned_at: parse_ts(2)?,
        executed_at: parse_ts(3)?,
        status: status.parse().unwrap_or(PostStatus::Failure),
        source_used: row.get(5)?,
        content_snapshot: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        error_detail: row.get(7)?,
    })
}

impl PostLedger for SqliteLedger {
    fn record(&self, attempt: &PostAttempt) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        tx.execute(
            r#"
            INSERT INTO posts (post_type, planned_at, executed_at, status, source_used, content, error_message)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                attempt.post_type.as_str(),
                attempt.planned_at.format(TIMESTAMP_FMT).to_string(),
                attempt.executed_at.format(TIMESTAMP_FMT).to_string(),
                attempt.status.as_str(),
                attempt.source_used,
                attempt.content_snapshot,
                attempt.error_detail,
            ],
        )
        .context("Failed to insert post attempt")?;

        let row_id = tx.last_insert_rowid();

        let success = u32::from(attempt.status == PostStatus::Success);
        let failure = u32::from(attempt.status == PostStatus::Failure);
        let scheduled = u32::from(attempt.post_type == PostType::Scheduled);
        let random = u32::from(attempt.post_type == PostType::Random);

        tx.execute(
            r#"
            INSERT INTO daily_stats (date, total_posts, successful_posts, failed_posts, scheduled_posts, random_posts)
            VALUES (?1, 1, ?2, ?3, ?4, ?5)
            ON CONFLICT(date) DO UPDATE SET
                total_posts = total_posts + 1,
                successful_posts = successful_posts + excluded.successful_posts,
                failed_posts = failed_posts + excluded.failed_posts,
                scheduled_posts = scheduled_posts + excluded.scheduled_posts,
                random_posts = random_posts + excluded.random_posts
            "#,
            params![
                attempt.executed_at.date().format(DATE_FMT).to_string(),
                success,
                failure,
                scheduled,
                random,
            ],
        )
        .context("Failed to upsert daily stats")?;

        tx.commit().context("Failed to commit post attempt")?;

        tracing::info!(
            id = row_id,
            post_type = %attempt.post_type,
            status = %attempt.status,
            source = attempt.source_used.as_deref().unwrap_or("-"),
            "Post attempt recorded"
        );

        Ok(row_id)
    }

    fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let conn = self.conn.lock().unwrap();

        let stats = conn
            .query_row(
                r#"
                SELECT total_posts, successful_posts, failed_posts, scheduled_posts, random_posts
                FROM daily_stats WHERE date = ?1
                "#,
                params![date.format(DATE_FMT).to_string()],
                |row| {
                    Ok(DailyStats {
                        date: Some(date),
                        total_posts: row.get(0)?,
                        successful_posts: row.get(1)?,
                        failed_posts: row.get(2)?,
                        scheduled_posts: row.get(3)?,
                        random_posts: row.get(4)?,
                    })
                },
            )
            .optional()
            .context("Failed to read daily stats")?;

        Ok(stats.unwrap_or_else(|| DailyStats::empty(date)))
    }

    fn recompute_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let mut stats = DailyStats::empty(date);

        {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                r#"
                SELECT id, post_type, planned_at, executed_at, status, source_used, content, error_message
                FROM posts WHERE date(executed_at) = ?1
                "#,
            )?;

            let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], row_to_attempt)?;

            for row in rows {
                stats.apply(&row?);
            }

            conn.execute(
                r#"
                INSERT INTO daily_stats (date, total_posts, successful_posts, failed_posts, scheduled_posts, random_posts)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(date) DO UPDATE SET
                    total_posts = excluded.total_posts,
                    successful_posts = excluded.successful_posts,
                    failed_posts = excluded.failed_posts,
                    scheduled_posts = excluded.scheduled_posts,
                    random_posts = excluded.random_posts
                "#,
                params![
                    date.format(DATE_FMT).to_string(),
                    stats.total_posts,
                    stats.successful_posts,
                    stats.failed_posts,
                    stats.scheduled_posts,
                    stats.random_posts,
                ],
            )
            .context("Failed to store recomputed stats")?;
        }

        Ok(stats)
    }

    fn count_for_day(&self, date: NaiveDate, post_type: Option<PostType>) -> Result<u32> {
        let conn = self.conn.lock().unwrap();
        let date_key = date.format(DATE_FMT).to_string();

        let count: u32 = match post_type {
            Some(t) => conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE date(executed_at) = ?1 AND post_type = ?2",
                params![date_key, t.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE date(executed_at) = ?1",
                params![date_key],
                |row| row.get(0),
            )?,
        };

        Ok(count)
    }

    fn last_post_time(&self, date: NaiveDate) -> Result<Option<NaiveDateTime>> {
        let conn = self.conn.lock().unwrap();

        let raw: Option<String> = conn
            .query_row(
                "SELECT executed_at FROM posts WHERE date(executed_at) = ?1 ORDER BY executed_at DESC, id DESC LIMIT 1",
                params![date.format(DATE_FMT).to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read last post time")?;

        match raw {
            Some(s) => Ok(Some(
                NaiveDateTime::parse_from_str(&s, TIMESTAMP_FMT)
                    .context("Malformed executed_at in ledger")?,
            )),
            None => Ok(None),
        }
    }

    fn recent_attempts(&self, limit: usize) -> Result<Vec<PostAttempt>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, post_type, planned_at, executed_at, status, source_used, content, error_message
            FROM posts ORDER BY id DESC LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_attempt)?;
        let attempts: Vec<PostAttempt> = rows.collect::<rusqlite::Result<_>>()?;

        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn attempt(
        post_type: PostType,
        status: PostStatus,
        h: u32,
        m: u32,
    ) -> PostAttempt {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        let mut a = PostAttempt::new(post_type, at, at);
        a.status = status;
        a.source_used = Some(String::from("Quotes API"));
        a.set_content("some content");
        a
    }

    #[test]
    fn test_record_assigns_ids_in_order() {
        let ledger = SqliteLedger::in_memory().unwrap();

        let first = ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 9, 0))
            .unwrap();
        let second = ledger
            .record(&attempt(PostType::Scheduled, PostStatus::Failure, 12, 0))
            .unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_counters_track_rows() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 9, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Random, PostStatus::Failure, 10, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Scheduled, PostStatus::Success, 12, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Test, PostStatus::Success, 13, 0))
            .unwrap();

        let stats = ledger.daily_stats(date).unwrap();
        assert_eq!(stats.total_posts, 4);
        assert_eq!(stats.successful_posts, 3);
        assert_eq!(stats.failed_posts, 1);
        assert_eq!(stats.random_posts, 2);
        assert_eq!(stats.scheduled_posts, 1);
    }

    #[test]
    fn test_stats_empty_for_untouched_day() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let stats = ledger.daily_stats(date).unwrap();
        assert_eq!(stats.total_posts, 0);
        assert_eq!(stats.date, Some(date));
    }

    #[test]
    fn test_recompute_matches_rows() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 9, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Scheduled, PostStatus::Failure, 12, 0))
            .unwrap();

        let recomputed = ledger.recompute_stats(date).unwrap();
        let cached = ledger.daily_stats(date).unwrap();

        assert_eq!(recomputed.total_posts, cached.total_posts);
        assert_eq!(recomputed.successful_posts, 1);
        assert_eq!(recomputed.failed_posts, 1);
    }

    #[test]
    fn test_count_for_day_filters_by_type() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 9, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 10, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Scheduled, PostStatus::Success, 12, 0))
            .unwrap();

        assert_eq!(ledger.count_for_day(date, None).unwrap(), 3);
        assert_eq!(
            ledger.count_for_day(date, Some(PostType::Random)).unwrap(),
            2
        );
        assert_eq!(
            ledger.count_for_day(date, Some(PostType::Test)).unwrap(),
            0
        );
    }

    #[test]
    fn test_last_post_time_and_recent() {
        let ledger = SqliteLedger::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        assert!(ledger.last_post_time(date).unwrap().is_none());

        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 9, 0))
            .unwrap();
        ledger
            .record(&attempt(PostType::Random, PostStatus::Success, 15, 30))
            .unwrap();

        let last = ledger.last_post_time(date).unwrap().unwrap();
        assert_eq!(last, date.and_hms_opt(15, 30, 0).unwrap());

        let recent = ledger.recent_attempts(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].executed_at, last);
        assert_eq!(recent[0].content_snapshot, "some content");
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let ledger = SqliteLedger::in_memory().unwrap();

        let mut a = attempt(PostType::Scheduled, PostStatus::Failure, 12, 0);
        a.error_detail = Some(String::from("HTTP 401: unauthorized"));
        ledger.record(&a).unwrap();

        let stored = &ledger.recent_attempts(1).unwrap()[0];
        assert_eq!(stored.post_type, PostType::Scheduled);
        assert_eq!(stored.status, PostStatus::Failure);
        assert_eq!(stored.source_used.as_deref(), Some("Quotes API"));
        assert_eq!(
            stored.error_detail.as_deref(),
            Some("HTTP 401: unauthorized")
        );
        assert!(stored.id.is_some());
    }
}
