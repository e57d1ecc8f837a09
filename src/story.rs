//! Story data model shared by the source fetchers and the storage layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a story was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Alphaxiv,
    Luminary,
}

impl Source {
    /// Stable string form used in row storage and story ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::Alphaxiv => "alphaxiv",
            Source::Luminary => "luminary",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance metadata for a fetched story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Originating source.
    pub source: Source,
    /// Subreddit name (Reddit stories only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    /// Author handle, when the source exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Upvote/vote score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    /// Comment count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
    /// Canonical URL as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Source-specific fields not worth promoting to first-class attributes
    /// (e.g. `arxiv_id`, `created_utc`, `selftext`, `comments_summary`).
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl SourceMeta {
    /// Create metadata with just a source; the rest defaults to empty.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            subreddit: None,
            author: None,
            score: None,
            comments: None,
            url: None,
            extra: BTreeMap::new(),
        }
    }

    /// Look up a non-empty `extra` field.
    pub fn extra_field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// One scraped item of content (post, thread, or paper).
///
/// The `id` is globally unique and stable across fetches of the same
/// underlying item, formed as `{source}-{natural-key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Short, human-presentable summary.
    pub summary: String,
    pub source_url: String,
    pub source_meta: SourceMeta,
    /// Full text used for embedding; longer than `summary`.
    #[serde(default)]
    pub raw_text: String,
    /// Labels attached by the fetcher; order is not significant for identity.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Story {
    /// The text fed to the embedding model: `raw_text` if non-empty,
    /// else `summary`, else `title`, else empty.
    pub fn embedding_text(&self) -> String {
        for candidate in [&self.raw_text, &self.summary, &self.title] {
            let trimmed = candidate.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        String::new()
    }

    /// The arXiv id participates in identity lookups, so it gets an accessor.
    pub fn arxiv_id(&self) -> Option<&str> {
        self.source_meta.extra_field("arxiv_id")
    }
}
