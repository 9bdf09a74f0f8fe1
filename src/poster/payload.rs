//! Post payload and multipart form encoding

use crate::config::PosterConfig;
use crate::content::ResolvedContent;
use reqwest::multipart::Form;

use super::hashtags;

/// One outgoing post, built from resolved content plus fixed metadata
#[derive(Debug, Clone, Default)]
pub struct PostPayload {
    /// Optional title (sent as an empty string when absent)
    pub title: Option<String>,

    /// Post body
    pub content: String,

    /// Hashtags without `#` prefix (an empty entry is sent when none)
    pub hashtags: Vec<String>,

    /// Media file URLs (omitted when empty)
    pub media_urls: Vec<String>,
}

impl PostPayload {
    /// Build a payload from resolved content, deriving hashtags from the body
    pub fn from_resolved(resolved: &ResolvedContent) -> Self {
        Self {
            title: resolved.title.clone(),
            content: resolved.content.clone(),
            hashtags: hashtags::generate(&resolved.content, &resolved.source_used),
            media_urls: Vec::new(),
        }
    }

    /// Encode as the multipart/form-data layout the posting API expects
    pub fn to_form(&self, meta: &PosterConfig) -> Form {
        let mut form = Form::new()
            .text("title", self.title.clone().unwrap_or_default())
            .text("category_id", meta.category_id.to_string())
            .text("state", meta.state.clone())
            .text("device", meta.device.clone())
            .text("city", meta.city.clone())
            .text("user_id", meta.user_id.to_string())
            .text("content", self.content.clone());

        for country in &meta.countries_iso {
            form = form.text("countries_iso[]", country.clone());
        }

        if self.hashtags.is_empty() {
            form = form.text("hashtags[]", String::new());
        } else {
            for tag in &self.hashtags {
                form = form.text("hashtags[]", tag.clone());
            }
        }

        for url in &self.media_urls {
            form = form.text("media_files_urls[]", url.clone());
        }

        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resolved_carries_fields() {
        let resolved = ResolvedContent {
            content: String::from("A quote about life and success"),
            title: Some(String::from("Activity")),
            source_used: String::from("Quotes API"),
        };

        let payload = PostPayload::from_resolved(&resolved);
        assert_eq!(payload.title.as_deref(), Some("Activity"));
        assert_eq!(payload.content, resolved.content);
        assert!(!payload.hashtags.is_empty());
        assert!(payload.media_urls.is_empty());
    }

    #[test]
    fn test_to_form_builds() {
        let payload = PostPayload {
            title: None,
            content: String::from("body"),
            hashtags: vec![],
            media_urls: vec![],
        };
        // Form has no inspectable API; building without panic is the contract
        let _form = payload.to_form(&PosterConfig::default());
    }
}
