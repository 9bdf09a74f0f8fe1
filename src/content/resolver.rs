//! Ordered content resolution with infallible fallback
//!
//! Sources are tried in catalog order; the first that returns non-empty
//! content within its timeout wins. When all of them fail, a static
//! fallback message is returned instead. Resolution itself never fails,
//! so content unavailability can never block a scheduled post.

use std::time::Duration;
use tracing::{debug, warn};

use super::fallback::{self, FALLBACK_SOURCE};
use super::source::{ContentError, ContentSource};

/// Content ready for submission, tagged with its origin
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    /// Post body
    pub content: String,

    /// Optional title
    pub title: Option<String>,

    /// Named source, or `"fallback"`
    pub source_used: String,
}

impl ResolvedContent {
    /// Whether this content came from the fallback pool
    pub fn is_fallback(&self) -> bool {
        self.source_used == FALLBACK_SOURCE
    }
}

/// Tries content sources in priority order, falling back on total failure
pub struct ContentResolver {
    sources: Vec<Box<dyn ContentSource>>,
    timeout: Duration,
}

impl ContentResolver {
    /// Create a resolver over an ordered source list with a per-source timeout
    pub fn new(sources: Vec<Box<dyn ContentSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    /// Number of configured sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Resolve content for one post
    ///
    /// Each source call is additionally bounded by an outer timer so a
    /// misbehaving implementation cannot stall the pipeline.
    pub async fn resolve(&self) -> ResolvedContent {
        for source in &self.sources {
            debug!(source = source.name(), "Trying content source");

            let result = tokio::time::timeout(self.timeout, source.fetch(self.timeout)).await;

            match result {
                Ok(Ok(fetched)) if !fetched.body.trim().is_empty() => {
                    debug!(source = source.name(), "Content fetched");
                    return ResolvedContent {
                        content: fetched.body,
                        title: fetched.title,
                        source_used: source.name().to_string(),
                    };
                }
                Ok(Ok(_)) => {
                    warn!(source = source.name(), "Source returned empty content");
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "Source failed");
                }
                Err(_) => {
                    let e = ContentError::Timeout(source.name().to_string());
                    warn!(source = source.name(), error = %e, "Source timed out");
                }
            }
        }

        warn!("All content sources failed, using fallback content");
        ResolvedContent {
            content: fallback::pick().to_string(),
            title: None,
            source_used: FALLBACK_SOURCE.to_string(),
        }
    }
}
