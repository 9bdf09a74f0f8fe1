//! Content source descriptors and the HTTP implementation
//!
//! Each source is a JSON API described by a [`SourceSpec`]: a URL plus
//! dot-notation keys locating the interesting fields in the response.
//! Numeric path segments index into arrays (e.g. `facts.0`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching content from a source
#[derive(Error, Debug)]
pub enum ContentError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source did not answer within the bounded timeout
    #[error("Source '{0}' timed out")]
    Timeout(String),

    /// Response parsed but the configured key was absent
    #[error("Source '{source_name}' response missing field '{key}'")]
    MissingField { source_name: String, key: String },

    /// Response body was not valid JSON
    #[error("Source '{source_name}' returned invalid JSON: {reason}")]
    InvalidJson { source_name: String, reason: String },

    /// Source returned an empty content string
    #[error("Source '{0}' returned empty content")]
    EmptyContent(String),
}

/// Declarative description of one content source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Human-readable source identifier (recorded as `source_used`)
    pub name: String,

    /// Endpoint URL returning JSON
    pub url: String,

    /// Dot-notation path to the main content field
    pub content_key: String,

    /// Optional path to an author field, appended as ` - {author}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_key: Option<String>,

    /// Optional path to a punchline field, appended on a new line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punchline_key: Option<String>,

    /// Optional path to a title field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_key: Option<String>,
}

impl SourceSpec {
    /// The default catalog of public content APIs, in priority order
    pub fn default_catalog() -> Vec<Self> {
        vec![
            Self {
                name: String::from("Quotes API"),
                url: String::from("https://api.quotable.io/random"),
                content_key: String::from("content"),
                author_key: Some(String::from("author")),
                punchline_key: None,
                title_key: None,
            },
            Self {
                name: String::from("Joke API"),
                url: String::from("https://official-joke-api.appspot.com/random_joke"),
                content_key: String::from("setup"),
                author_key: None,
                punchline_key: Some(String::from("punchline")),
                title_key: None,
            },
            Self {
                name: String::from("Advice API"),
                url: String::from("https://api.adviceslip.com/advice"),
                content_key: String::from("slip.advice"),
                author_key: None,
                punchline_key: None,
                title_key: None,
            },
            Self {
                name: String::from("Useless Facts API"),
                url: String::from("https://uselessfacts.jsph.pl/api/v2/facts/random"),
                content_key: String::from("text"),
                author_key: None,
                punchline_key: None,
                title_key: None,
            },
            Self {
                name: String::from("Dog Facts API"),
                url: String::from("https://dog-api.kinduff.com/api/facts"),
                content_key: String::from("facts.0"),
                author_key: None,
                punchline_key: None,
                title_key: None,
            },
            Self {
                name: String::from("Random Word API"),
                url: String::from("https://random-word-api.herokuapp.com/word"),
                content_key: String::from("0"),
                author_key: None,
                punchline_key: None,
                title_key: None,
            },
            Self {
                name: String::from("Bored API"),
                url: String::from("https://www.boredapi.com/api/activity"),
                content_key: String::from("activity"),
                author_key: None,
                punchline_key: None,
                title_key: Some(String::from("type")),
            },
        ]
    }
}

/// Raw content returned by a source
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Assembled post body (content plus author/punchline decorations)
    pub body: String,

    /// Optional title extracted from the response
    pub title: Option<String>,
}

/// A single content origin the resolver can try
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Source identifier used for logging and `source_used` tagging
    fn name(&self) -> &str;

    /// Fetch content, bounded by `timeout`
    async fn fetch(&self, timeout: Duration) -> Result<FetchedContent, ContentError>;
}

/// HTTP content source driven by a [`SourceSpec`]
pub struct HttpContentSource {
    spec: SourceSpec,
    client: Client,
}

impl HttpContentSource {
    /// Create a source from its spec, sharing the given HTTP client
    pub fn new(spec: SourceSpec, client: Client) -> Self {
        Self { spec, client }
    }

    /// Build the whole catalog from specs with one shared client
    pub fn catalog(specs: &[SourceSpec], client: &Client) -> Vec<Box<dyn ContentSource>> {
        specs
            .iter()
            .map(|spec| {
                Box::new(Self::new(spec.clone(), client.clone())) as Box<dyn ContentSource>
            })
            .collect()
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn fetch(&self, timeout: Duration) -> Result<FetchedContent, ContentError> {
        let response = self
            .client
            .get(&self.spec.url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let data: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| ContentError::InvalidJson {
                    source_name: self.spec.name.clone(),
                    reason: e.to_string(),
                })?;

        let content =
            json_path(&data, &self.spec.content_key).ok_or_else(|| ContentError::MissingField {
                source_name: self.spec.name.clone(),
                key: self.spec.content_key.clone(),
            })?;

        if content.trim().is_empty() {
            return Err(ContentError::EmptyContent(self.spec.name.clone()));
        }

        let mut body = content;

        if let Some(key) = &self.spec.author_key {
            if let Some(author) = json_path(&data, key) {
                body.push_str(&format!(" - {author}"));
            }
        }

        if let Some(key) = &self.spec.punchline_key {
            if let Some(punchline) = json_path(&data, key) {
                body.push('\n');
                body.push_str(&punchline);
            }
        }

        let title = self
            .spec
            .title_key
            .as_ref()
            .and_then(|key| json_path(&data, key));

        Ok(FetchedContent { body, title })
    }
}

/// Resolve a dot-notation path against a JSON value
///
/// Numeric segments index arrays; string values are returned without
/// surrounding quotes, other scalars via their JSON rendering.
pub fn json_path(data: &serde_json::Value, path: &str) -> Option<String> {
    let mut current = data;

    for segment in path.split('.') {
        current = match current {
            serde_json::Value::Object(map) => map.get(segment)?,
            serde_json::Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            _ => return None,
        };
    }

    match current {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
