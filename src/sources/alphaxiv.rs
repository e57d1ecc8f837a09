//! alphaXiv trending fetcher.
//!
//! Scrapes the explore page for trending paper threads, then batch-fetches
//! the papers' abstracts from the arXiv export API (an Atom feed).

use super::{fetch_with_retries, StorySource};
use crate::error::{Result, SendeError};
use crate::story::{Source, SourceMeta, Story};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{instrument, warn};

const EXPLORE_URL: &str = "https://www.alphaxiv.org/explore";
const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
const FETCH_RETRIES: usize = 3;
const ABSTRACT_SNIPPET_CHARS: usize = 500;

#[derive(Debug)]
struct TrendingEntry {
    title: String,
    arxiv_id: String,
    url: String,
    discussion_highlights: String,
    score: Option<i64>,
}

/// Fetcher for trending alphaXiv threads.
pub struct AlphaxivSource {
    client: reqwest::Client,
    limit: usize,
    live: bool,
}

impl AlphaxivSource {
    pub fn new(limit: usize, user_agent: &str, live: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| SendeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            limit,
            live,
        })
    }

    async fn fetch_live(&self) -> Result<Vec<Story>> {
        let html = match fetch_with_retries(&self.client, EXPLORE_URL, FETCH_RETRIES).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Explore page unavailable: {}", e);
                return Ok(Vec::new());
            }
        };

        let entries = parse_trending(&html, self.limit);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let arxiv_ids: Vec<String> = entries.iter().map(|e| e.arxiv_id.clone()).collect();
        let abstracts = self.fetch_abstracts(&arxiv_ids).await;

        let stories = entries
            .into_iter()
            .map(|entry| {
                let abstract_snippet = abstracts
                    .get(&entry.arxiv_id)
                    .map(|text| {
                        text.chars()
                            .take(ABSTRACT_SNIPPET_CHARS)
                            .collect::<String>()
                            .trim()
                            .to_string()
                    })
                    .unwrap_or_default();

                let summary = if !abstract_snippet.is_empty() {
                    abstract_snippet.clone()
                } else if !entry.discussion_highlights.is_empty() {
                    entry.discussion_highlights.clone()
                } else {
                    entry.title.clone()
                };

                let raw_text_parts: Vec<&str> =
                    [abstract_snippet.as_str(), entry.discussion_highlights.as_str()]
                        .into_iter()
                        .filter(|t| !t.is_empty())
                        .collect();
                let raw_text = raw_text_parts.join("\n\n");

                let mut meta = SourceMeta::new(Source::Alphaxiv);
                meta.score = entry.score;
                meta.url = Some(entry.url.clone());
                meta.extra
                    .insert("arxiv_id".to_string(), entry.arxiv_id.clone());
                meta.extra
                    .insert("abstract_snippet".to_string(), abstract_snippet);
                meta.extra.insert(
                    "discussion_highlights".to_string(),
                    entry.discussion_highlights.clone(),
                );

                Story {
                    id: format!("alphaxiv-{}", entry.arxiv_id),
                    title: entry.title,
                    summary,
                    source_url: entry.url,
                    source_meta: meta,
                    raw_text,
                    tags: vec!["alphaxiv".to_string(), "arxiv".to_string()],
                }
            })
            .collect();

        Ok(stories)
    }

    /// Batch-fetch abstracts from the arXiv export API. Failures degrade
    /// to an empty map; the stories then fall back to discussion text.
    async fn fetch_abstracts(&self, arxiv_ids: &[String]) -> HashMap<String, String> {
        if arxiv_ids.is_empty() {
            return HashMap::new();
        }

        let url = format!("{}?id_list={}", ARXIV_API_URL, arxiv_ids.join(","));
        match fetch_with_retries(&self.client, &url, FETCH_RETRIES).await {
            Ok(body) => parse_abstract_feed(body.as_bytes()),
            Err(e) => {
                warn!("arXiv abstracts unavailable: {}", e);
                HashMap::new()
            }
        }
    }

    fn fetch_stub(&self) -> Vec<Story> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let mut stories = Vec::new();

        for idx in 0..self.limit {
            let arxiv_id = format!("0000.{:05}", idx);
            let source_url = format!("https://alphaxiv.org/abs/{}", arxiv_id);
            let summary = "Placeholder summary for a trending paper discussion.".to_string();

            let mut meta = SourceMeta::new(Source::Alphaxiv);
            meta.author = Some("anon".to_string());
            meta.score = Some(50 - idx as i64);
            meta.comments = Some(5 + idx as i64);
            meta.url = Some(source_url.clone());
            meta.extra.insert("date".to_string(), today.clone());
            meta.extra.insert("arxiv_id".to_string(), arxiv_id.clone());

            stories.push(Story {
                id: format!("alphaxiv-{}", idx),
                title: format!("Trending paper {}", idx + 1),
                summary: summary.clone(),
                source_url,
                source_meta: meta,
                raw_text: summary,
                tags: vec!["stub".to_string(), "alphaxiv".to_string()],
            });
        }

        stories
    }
}

#[async_trait]
impl StorySource for AlphaxivSource {
    fn name(&self) -> &'static str {
        "alphaxiv"
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

/// Pull trending entries out of the explore page markup: anchors to
/// `/abs/<arxiv-id>` with a rendered title, wrapped in a card that carries
/// the discussion snippet and vote button.
fn parse_trending(html: &str, limit: usize) -> Vec<TrendingEntry> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href^='/abs/']").expect("valid selector");
    let title_selector = Selector::parse("div.tiptap.html-renderer").expect("valid selector");
    let highlight_selector = Selector::parse("p.line-clamp-4").expect("valid selector");
    let button_selector = Selector::parse("button").expect("valid selector");
    let arxiv_re = Regex::new(r"/abs/(\d{4}\.\d{4,5})").expect("valid regex");
    let vote_re = Regex::new(r"\b(\d+)\b").expect("valid regex");

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(title_el) = anchor.select(&title_selector).next() else {
            continue;
        };
        let title = normalize_text(title_el);

        let href = anchor.value().attr("href").unwrap_or("");
        let Some(caps) = arxiv_re.captures(href) else {
            continue;
        };
        let arxiv_id = caps[1].to_string();
        if !seen_ids.insert(arxiv_id.clone()) {
            continue;
        }

        let card = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().classes().any(|c| c.contains("rounded-xl")));

        let mut discussion_highlights = String::new();
        let mut score = None;
        if let Some(card) = card {
            if let Some(p) = card.select(&highlight_selector).next() {
                discussion_highlights = normalize_text(p);
            }
            for button in card.select(&button_selector) {
                let text = normalize_text(button);
                if let Some(caps) = vote_re.captures(&text) {
                    if let Ok(votes) = caps[1].parse::<i64>() {
                        score = Some(votes);
                        break;
                    }
                }
            }
        }

        results.push(TrendingEntry {
            title,
            url: format!("https://www.alphaxiv.org/abs/{}", arxiv_id),
            arxiv_id,
            discussion_highlights,
            score,
        });

        if results.len() >= limit {
            break;
        }
    }

    results
}

/// Parse the arXiv Atom response into `arxiv_id -> abstract`.
fn parse_abstract_feed(body: &[u8]) -> HashMap<String, String> {
    let Ok(feed) = feed_rs::parser::parse(body) else {
        return HashMap::new();
    };

    let mut abstracts = HashMap::new();
    for entry in feed.entries {
        // Entry ids look like "http://arxiv.org/abs/2401.01234v1"; strip
        // the path and version suffix to match the scraped ids.
        let raw_id = entry.id.rsplit('/').next().unwrap_or("");
        let arxiv_id = raw_id.split('v').next().unwrap_or(raw_id);
        if arxiv_id.is_empty() {
            continue;
        }

        let Some(summary) = entry.summary else {
            continue;
        };
        let collapsed = summary.content.split_whitespace().collect::<Vec<_>>().join(" ");
        abstracts.insert(arxiv_id.to_string(), collapsed);
    }
    abstracts
}

fn normalize_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPLORE_FIXTURE: &str = r#"
        <html><body>
          <div class="rounded-xl border">
            <a href="/abs/2401.01234">
              <div class="tiptap html-renderer">Scaling Laws, Revisited</div>
            </a>
            <p class="line-clamp-4">Lively thread about compute budgets.</p>
            <button><span>42</span></button>
          </div>
          <div class="rounded-xl border">
            <a href="/abs/2401.05678v2">
              <div class="tiptap html-renderer">Sparse Attention at Scale</div>
            </a>
          </div>
          <a href="/abs/2401.01234">
            <div class="tiptap html-renderer">Duplicate of the first</div>
          </a>
          <a href="/user/profile">not a paper</a>
        </body></html>
    "#;

    #[test]
    fn test_parse_trending_extracts_cards() {
        let entries = parse_trending(EXPLORE_FIXTURE, 10);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].arxiv_id, "2401.01234");
        assert_eq!(entries[0].title, "Scaling Laws, Revisited");
        assert_eq!(entries[0].url, "https://www.alphaxiv.org/abs/2401.01234");
        assert_eq!(
            entries[0].discussion_highlights,
            "Lively thread about compute budgets."
        );
        assert_eq!(entries[0].score, Some(42));

        assert_eq!(entries[1].arxiv_id, "2401.05678");
        assert_eq!(entries[1].discussion_highlights, "");
        assert_eq!(entries[1].score, None);
    }

    #[test]
    fn test_parse_trending_honors_limit() {
        let entries = parse_trending(EXPLORE_FIXTURE, 1);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_abstract_feed() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>ArXiv Query</title>
              <id>http://arxiv.org/api/query</id>
              <updated>2026-02-04T00:00:00Z</updated>
              <entry>
                <id>http://arxiv.org/abs/2401.01234v1</id>
                <title>Scaling Laws, Revisited</title>
                <summary>  We study   scaling laws
                   across compute budgets.  </summary>
              </entry>
            </feed>"#;

        let abstracts = parse_abstract_feed(atom.as_bytes());
        assert_eq!(
            abstracts.get("2401.01234").map(String::as_str),
            Some("We study scaling laws across compute budgets.")
        );
    }

    #[tokio::test]
    async fn test_stub_carries_arxiv_ids() {
        let source = AlphaxivSource::new(2, "sende/test", false).unwrap();
        let stories = source.fetch().await.unwrap();

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].arxiv_id(), Some("0000.00000"));
        assert!(stories.iter().all(|s| !s.embedding_text().is_empty()));
    }
}
