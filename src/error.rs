//! Unified error handling for the cadence crate
//!
//! Domain-specific errors (content, delivery, scheduler) stay in their
//! modules; this module wraps them into a single `Error` enum for use
//! across module boundaries, classified by [`ErrorCategory`] so callers
//! can pick a handling strategy without matching every variant.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::content::ContentError;
pub use crate::poster::DeliveryError;
pub use crate::scheduler::SchedulerError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Content acquisition failures (recovered via fallback upstream)
    Content,
    /// Failures delivering to the posting endpoint
    Delivery,
    /// Ledger/storage failures
    Persistence,
    /// Slot planning and scheduling failures
    Scheduling,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the cadence crate
#[derive(Error, Debug)]
pub enum Error {
    /// Content source errors
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Check if this error is recoverable (worth retrying)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Content(_) => true,
            Self::Delivery(e) => e.is_transient(),
            Self::Scheduler(_) => false,
            Self::Database(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(_) => true,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Content(_) => ErrorCategory::Content,
            Self::Delivery(_) | Self::Http(_) => ErrorCategory::Delivery,
            Self::Scheduler(_) => ErrorCategory::Scheduling,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Persistence,
            Self::Json(_) => ErrorCategory::Other,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
