//! Content acquisition for outgoing posts
//!
//! Content is pulled from an ordered catalog of JSON APIs; when every
//! source fails or times out, a static fallback message is used instead so
//! a scheduled post is never blocked by content unavailability.

pub mod fallback;
pub mod resolver;
pub mod source;

pub use fallback::FALLBACK_SOURCE;
pub use resolver::{ContentResolver, ResolvedContent};
pub use source::{ContentError, ContentSource, FetchedContent, HttpContentSource, SourceSpec};
