//! Persistence layer
//!
//! One logical store: post attempt rows plus per-day aggregate counters.
//! Rows are the source of truth; counters are a cache maintained in the
//! same transaction and recomputable by rescanning rows.

pub mod repository;

pub use repository::{PostLedger, SqliteLedger};
