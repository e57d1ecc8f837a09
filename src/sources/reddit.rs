//! Reddit fetcher.
//!
//! Reads the public JSON listings for each configured subreddit, taking
//! top-of-day and hot posts from the last 24 hours, and summarizes the
//! top comments of each post for the story's raw text.

use super::{fetch_with_retries, StorySource};
use crate::error::{Result, SendeError};
use crate::story::{Source, SourceMeta, Story};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const FETCH_RETRIES: usize = 3;
const MAX_COMMENT_SUMMARIES: usize = 3;
const COMMENT_SNIPPET_CHARS: usize = 220;
const COMMENT_SUMMARY_CHARS: usize = 500;
const SELFTEXT_SUMMARY_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Debug, Default, Deserialize)]
struct Submission {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Debug, Deserialize)]
struct CommentListing {
    data: CommentListingData,
}

#[derive(Debug, Deserialize)]
struct CommentListingData {
    #[serde(default)]
    children: Vec<CommentChild>,
}

#[derive(Debug, Deserialize)]
struct CommentChild {
    #[serde(default)]
    data: Comment,
}

#[derive(Debug, Default, Deserialize)]
struct Comment {
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
}

/// Fetcher for top Reddit posts.
pub struct RedditSource {
    client: reqwest::Client,
    subreddits: Vec<String>,
    limit_per_subreddit: usize,
    live: bool,
}

impl RedditSource {
    pub fn new(
        subreddits: Vec<String>,
        limit_per_subreddit: usize,
        user_agent: &str,
        live: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| SendeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            subreddits,
            limit_per_subreddit,
            live,
        })
    }

    async fn fetch_live(&self) -> Result<Vec<Story>> {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut stories: Vec<Story> = Vec::new();

        for subreddit in &self.subreddits {
            let mut count = 0usize;

            'feeds: for feed in ["top", "hot"] {
                let url = match feed {
                    "top" => format!(
                        "https://www.reddit.com/r/{}/top.json?t=day&limit={}&raw_json=1",
                        subreddit,
                        self.limit_per_subreddit * 2
                    ),
                    _ => format!(
                        "https://www.reddit.com/r/{}/hot.json?limit={}&raw_json=1",
                        subreddit,
                        self.limit_per_subreddit * 2
                    ),
                };

                let listing = match self.fetch_listing(&url).await {
                    Ok(listing) => listing,
                    Err(e) => {
                        warn!("Skipping r/{} {} feed: {}", subreddit, feed, e);
                        continue;
                    }
                };

                for child in listing.data.children {
                    let post = child.data;
                    if post.id.is_empty() {
                        continue;
                    }
                    let Some(created) =
                        DateTime::<Utc>::from_timestamp(post.created_utc as i64, 0)
                    else {
                        continue;
                    };
                    if created < cutoff {
                        continue;
                    }
                    if !seen_ids.insert(post.id.clone()) {
                        continue;
                    }

                    let comments_summary =
                        self.summarize_comments(subreddit, &post.id).await;
                    stories.push(Self::build_story(subreddit, feed, &post, created, comments_summary));

                    count += 1;
                    if count >= self.limit_per_subreddit {
                        break 'feeds;
                    }
                }
            }
        }

        Ok(stories)
    }

    async fn fetch_listing(&self, url: &str) -> Result<Listing> {
        let body = fetch_with_retries(&self.client, url, FETCH_RETRIES).await?;
        serde_json::from_str(&body)
            .map_err(|e| SendeError::Source(format!("unexpected listing shape from {}: {}", url, e)))
    }

    /// Condense the top comments of a post into one line. Comment fetch
    /// failures degrade to an empty summary rather than dropping the post.
    async fn summarize_comments(&self, subreddit: &str, post_id: &str) -> String {
        let url = format!(
            "https://www.reddit.com/r/{}/comments/{}.json?limit=25&sort=top&raw_json=1",
            subreddit, post_id
        );

        let body = match fetch_with_retries(&self.client, &url, FETCH_RETRIES).await {
            Ok(body) => body,
            Err(e) => {
                debug!("No comment summary for {}: {}", post_id, e);
                return String::new();
            }
        };

        // The comments endpoint returns [post listing, comment listing].
        let listings: Vec<CommentListing> = match serde_json::from_str(&body) {
            Ok(listings) => listings,
            Err(_) => return String::new(),
        };
        let Some(comments) = listings.get(1) else {
            return String::new();
        };

        let mut top: Vec<&Comment> = comments
            .data
            .children
            .iter()
            .map(|c| &c.data)
            .filter(|c| !c.body.is_empty())
            .collect();
        top.sort_by_key(|c| std::cmp::Reverse(c.score));
        top.truncate(MAX_COMMENT_SUMMARIES);

        let mut parts = Vec::new();
        for (idx, comment) in top.iter().enumerate() {
            let mut body = comment.body.split_whitespace().collect::<Vec<_>>().join(" ");
            if body.chars().count() > COMMENT_SNIPPET_CHARS {
                body = truncate_chars(&body, COMMENT_SNIPPET_CHARS - 3)
                    .trim_end()
                    .to_string()
                    + "...";
            }
            parts.push(format!("{}) {} (score {})", idx + 1, body, comment.score));
        }

        if parts.is_empty() {
            return String::new();
        }
        truncate_chars(
            &format!("Top comments: {}", parts.join(" ")),
            COMMENT_SUMMARY_CHARS,
        )
    }

    fn build_story(
        subreddit: &str,
        feed: &str,
        post: &Submission,
        created: DateTime<Utc>,
        comments_summary: String,
    ) -> Story {
        let selftext = post.selftext.trim();
        let mut summary = truncate_chars(selftext, SELFTEXT_SUMMARY_CHARS);
        if summary.is_empty() {
            summary = if comments_summary.is_empty() {
                post.title.clone()
            } else {
                comments_summary.clone()
            };
        }

        let raw_text_parts: Vec<&str> = [selftext, comments_summary.as_str()]
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        let raw_text = raw_text_parts.join("\n\n");

        let mut meta = SourceMeta::new(Source::Reddit);
        meta.subreddit = Some(subreddit.to_string());
        meta.author = post.author.clone();
        meta.score = Some(post.score);
        meta.comments = Some(post.num_comments);
        meta.url = Some(post.url.clone());
        meta.extra
            .insert("created_utc".to_string(), created.to_rfc3339());
        meta.extra
            .insert("selftext".to_string(), selftext.to_string());
        meta.extra
            .insert("comments_summary".to_string(), comments_summary);
        meta.extra.insert("feed".to_string(), feed.to_string());

        Story {
            id: format!("reddit-{}", post.id),
            title: post.title.clone(),
            summary,
            source_url: post.url.clone(),
            source_meta: meta,
            raw_text,
            tags: vec!["reddit".to_string(), subreddit.to_string()],
        }
    }

    fn fetch_stub(&self) -> Vec<Story> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut stories = Vec::new();

        for subreddit in &self.subreddits {
            for idx in 0..self.limit_per_subreddit {
                let story_id = format!("reddit-{}-{}", subreddit, idx);
                let source_url =
                    format!("https://reddit.com/r/{}/comments/{}", subreddit, story_id);
                let summary = format!(
                    "Placeholder summary for r/{} post {}.",
                    subreddit,
                    idx + 1
                );

                let mut meta = SourceMeta::new(Source::Reddit);
                meta.subreddit = Some(subreddit.clone());
                meta.author = Some("stub_user".to_string());
                meta.score = Some(100 - idx as i64);
                meta.comments = Some(10 + idx as i64);
                meta.url = Some(source_url.clone());
                meta.extra.insert("date".to_string(), today.clone());

                stories.push(Story {
                    id: story_id,
                    title: format!("[{}] Placeholder post {}", subreddit, idx + 1),
                    summary: summary.clone(),
                    source_url,
                    source_meta: meta,
                    raw_text: summary,
                    tags: vec!["stub".to_string(), "reddit".to_string()],
                });
            }
        }

        stories
    }
}

#[async_trait]
impl StorySource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<Story>> {
        if self.live {
            self.fetch_live().await
        } else {
            Ok(self.fetch_stub())
        }
    }
}

/// Truncate to a character budget without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_yields_per_subreddit_limit() {
        let source = RedditSource::new(
            vec!["singularity".to_string(), "LocalLLaMA".to_string()],
            2,
            "sende/test",
            false,
        )
        .unwrap();

        let stories = source.fetch().await.unwrap();
        assert_eq!(stories.len(), 4);
        assert_eq!(stories[0].id, "reddit-singularity-0");
        assert!(stories.iter().all(|s| !s.embedding_text().is_empty()));
    }

    #[test]
    fn test_listing_parse() {
        let body = r#"{
            "data": {
                "children": [
                    {"data": {"id": "abc123", "title": "A post", "selftext": "text",
                              "url": "https://example.com", "score": 42,
                              "num_comments": 7, "author": "someone",
                              "created_utc": 1770000000.0}}
                ]
            }
        }"#;
        let listing: Listing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.id, "abc123");
        assert_eq!(listing.data.children[0].data.score, 42);
    }

    #[test]
    fn test_build_story_falls_back_to_comments_then_title() {
        let post = Submission {
            id: "xyz".to_string(),
            title: "Title only".to_string(),
            url: "https://example.com/xyz".to_string(),
            ..Default::default()
        };
        let created = Utc::now();

        let story = RedditSource::build_story(
            "singularity",
            "top",
            &post,
            created,
            "Top comments: 1) neat (score 5)".to_string(),
        );
        assert!(story.summary.starts_with("Top comments:"));
        assert_eq!(story.raw_text, "Top comments: 1) neat (score 5)");

        let story = RedditSource::build_story("singularity", "top", &post, created, String::new());
        assert_eq!(story.summary, "Title only");
        assert_eq!(story.embedding_text(), "Title only");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
