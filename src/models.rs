// Core data structures for the cadence poster

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum length of the content snapshot stored per attempt
pub const CONTENT_SNAPSHOT_MAX: usize = 500;

/// Kind of post trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostType {
    /// The fixed daily slot
    Scheduled,
    /// One of the randomly distributed slots
    Random,
    /// Manually triggered test post
    Test,
}

impl PostType {
    /// Get string representation (matches the database enum values)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Random => "RANDOM",
            Self::Test => "TEST",
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "RANDOM" => Ok(Self::Random),
            "TEST" => Ok(Self::Test),
            other => Err(format!("unknown post type: {other}")),
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of a post attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Success,
    Failure,
}

impl PostStatus {
    /// Get string representation (matches the database enum values)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One execution of the delivery pipeline
///
/// Exactly one record is created per fired trigger; submitter-internal
/// retries refine the single record rather than adding rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAttempt {
    /// Row id, assigned by the ledger on persist
    pub id: Option<i64>,

    /// Trigger classification
    pub post_type: PostType,

    /// When the slot was planned to fire (equals `executed_at` for manual triggers)
    pub planned_at: NaiveDateTime,

    /// When the pipeline actually ran
    pub executed_at: NaiveDateTime,

    /// Terminal outcome
    pub status: PostStatus,

    /// Content origin: a named source or `"fallback"`
    pub source_used: Option<String>,

    /// Truncated copy of the posted content
    pub content_snapshot: String,

    /// Human-readable error detail for failed attempts
    pub error_detail: Option<String>,
}

impl PostAttempt {
    /// Create an in-memory attempt for a fired trigger; persisted once terminal
    pub fn new(post_type: PostType, planned_at: NaiveDateTime, executed_at: NaiveDateTime) -> Self {
        Self {
            id: None,
            post_type,
            planned_at,
            executed_at,
            status: PostStatus::Failure,
            source_used: None,
            content_snapshot: String::new(),
            error_detail: None,
        }
    }

    /// Set the content snapshot, truncating at a char boundary if oversized
    pub fn set_content(&mut self, content: &str) {
        self.content_snapshot = truncate_chars(content, CONTENT_SNAPSHOT_MAX);
    }
}

/// Truncate a string to at most `max` characters
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Aggregate counters for one calendar day
///
/// Rows are the source of truth; these counters are a cache maintained
/// alongside each persisted attempt and recomputable by rescanning rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: Option<NaiveDate>,
    pub total_posts: u32,
    pub successful_posts: u32,
    pub failed_posts: u32,
    pub scheduled_posts: u32,
    pub random_posts: u32,
}

impl DailyStats {
    /// Empty stats for a date (no rows written yet)
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    /// Calculate success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_posts == 0 {
            return 1.0;
        }
        f64::from(self.successful_posts) / f64::from(self.total_posts)
    }

    /// Apply one attempt to the counters
    pub fn apply(&mut self, attempt: &PostAttempt) {
        self.total_posts += 1;
        match attempt.status {
            PostStatus::Success => self.successful_posts += 1,
            PostStatus::Failure => self.failed_posts += 1,
        }
        match attempt.post_type {
            PostType::Scheduled => self.scheduled_posts += 1,
            PostType::Random => self.random_posts += 1,
            PostType::Test => {}
        }
    }
}
