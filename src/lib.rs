//! cadence - Intelligent Post Scheduler & Delivery Pipeline
//!
//! Automatically publishes short text content at one fixed time plus a
//! configurable number of randomly planned slots each day, pulling content
//! from a catalog of public APIs with a static fallback pool.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`scheduler`] - Daily slot planning and the delivery loop
//! - [`content`] - Content source catalog, resolution and fallback
//! - [`poster`] - Payload assembly and retrying endpoint submission
//! - [`models`] - Core data structures and types
//! - [`storage`] - Durable post ledger (SQLite)
//! - [`notifications`] - Best-effort operator notifications
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use cadence::config::Config;
//! use cadence::scheduler::Scheduler;
//! use cadence::storage::SqliteLedger;
//! use cadence::notifications::NoopNotifier;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let ledger = Arc::new(SqliteLedger::new(&config.database.sqlite_path)?);
//!     let scheduler = Scheduler::new(config, ledger, Arc::new(NoopNotifier))?;
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!     scheduler.run(rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod notifications;
pub mod poster;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::content::{ContentResolver, ResolvedContent};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{DailyStats, PostAttempt, PostStatus, PostType};
    pub use crate::poster::{SubmitOutcome, Submitter};
    pub use crate::scheduler::{DailyPlan, Scheduler};
    pub use crate::storage::{PostLedger, SqliteLedger};
}

// Direct re-exports for convenience
pub use models::{DailyStats, PostAttempt, PostStatus, PostType};
