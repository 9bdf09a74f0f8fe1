//! Error types for the scheduler module

use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Fixed post time did not parse as HH:MM
    #[error("Invalid fixed post time '{0}'. Expected HH:MM")]
    InvalidFixedTime(String),

    /// HTTP client construction failed
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}
