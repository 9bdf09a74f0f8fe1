//! Hashtag derivation from post content
//!
//! Picks up to three hashtags by matching source-specific keyword pools
//! against the content, with a length-based generic fallback.

/// Maximum hashtags attached to one post
const MAX_HASHTAGS: usize = 3;

/// Generate hashtags (without `#` prefix) for content from a named source
pub fn generate(content: &str, source_name: &str) -> Vec<String> {
    let pool: &[&str] = match source_name {
        "Quotes API" => &[
            "inspiration",
            "motivation",
            "success",
            "life",
            "dreams",
            "goals",
            "wisdom",
            "quote",
        ],
        "Joke API" => &["funny", "humor", "joke", "laugh", "comedy", "wit"],
        "Advice API" => &["advice", "tips", "help", "guidance", "wisdom", "life"],
        "Useless Facts API" => &[
            "fact",
            "interesting",
            "knowledge",
            "learn",
            "science",
            "amazing",
        ],
        "Dog Facts API" => &["dog", "pet", "animal", "puppy", "canine"],
        "Random Word API" => &["word", "vocabulary", "language", "learning"],
        "Bored API" => &["activity", "fun", "entertainment", "hobby", "leisure"],
        _ => &[
            "life",
            "love",
            "success",
            "happiness",
            "motivation",
            "inspiration",
        ],
    };

    let lower = content.to_lowercase();
    let mut tags: Vec<String> = pool
        .iter()
        .filter(|word| lower.contains(&word.to_lowercase()))
        .take(MAX_HASHTAGS)
        .map(|word| word.to_string())
        .collect();

    if tags.is_empty() {
        tags = generic_tags(content);
    }

    tags
}

/// Length-based generic tags when no keyword matched
fn generic_tags(content: &str) -> Vec<String> {
    let tags: &[&str] = if content.len() < 100 {
        &["short", "quick"]
    } else if content.len() > 200 {
        &["long", "detailed"]
    } else {
        &["content"]
    };

    tags.iter().map(|t| t.to_string()).collect()
}
