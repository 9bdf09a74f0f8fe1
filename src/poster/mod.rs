//! Post payload construction and delivery
//!
//! The submitter owns the bounded retry loop against the posting API:
//! transient failures (network, timeout, 5xx) are retried with exponential
//! backoff, terminal failures (4xx) are reported immediately. It performs
//! no persistence; the scheduler records the single outcome per trigger.

pub mod hashtags;
pub mod payload;
pub mod submitter;

pub use payload::PostPayload;
pub use submitter::{DeliveryError, SubmitOutcome, Submitter};
