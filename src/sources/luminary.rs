//! Luminary posts fetcher (blogs and social feeds from notable AI figures).
//!
//! Live integrations are not wired up yet; only the stub produces stories.

use super::StorySource;
use crate::error::{Result, SendeError};
use crate::story::{Source, SourceMeta, Story};
use async_trait::async_trait;

/// Fetcher for luminary posts.
pub struct LuminarySource {
    limit: usize,
    live: bool,
}

impl LuminarySource {
    pub fn new(limit: usize, live: bool) -> Self {
        Self { limit, live }
    }

    fn fetch_stub(&self) -> Vec<Story> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let mut stories = Vec::new();

        for idx in 0..self.limit {
            let source_url = format!("https://example.com/luminary/{}", idx);
            let summary = "Placeholder update from an AI luminary blog or thread.".to_string();

            let mut meta = SourceMeta::new(Source::Luminary);
            meta.author = Some(format!("luminary_{}", idx));
            meta.score = Some(20 - idx as i64);
            meta.comments = Some(0);
            meta.url = Some(source_url.clone());
            meta.extra.insert("date".to_string(), today.clone());

            stories.push(Story {
                id: format!("luminary-{}", idx),
                title: format!("Luminary update {}", idx + 1),
                summary: summary.clone(),
                source_url,
                source_meta: meta,
                raw_text: summary,
                tags: vec!["stub".to_string(), "luminary".to_string()],
            });
        }

        stories
    }
}

#[async_trait]
impl StorySource for LuminarySource {
    fn name(&self) -> &'static str {
        "luminary"
    }

    async fn fetch(&self) -> Result<Vec<Story>> {
        if self.live {
            return Err(SendeError::Source(
                "luminary feeds are not implemented; run in stub mode".to_string(),
            ));
        }
        Ok(self.fetch_stub())
    }
}
