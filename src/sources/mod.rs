//! Story sources.
//!
//! Each source produces a batch of stories, either from its live
//! integration or from a deterministic stub for test runs.

mod alphaxiv;
mod luminary;
mod reddit;

pub use alphaxiv::AlphaxivSource;
pub use luminary::LuminarySource;
pub use reddit::RedditSource;

use crate::error::{Result, SendeError};
use crate::story::Story;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Trait for story fetchers.
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Source name for logs.
    fn name(&self) -> &'static str;

    /// Fetch a batch of stories.
    async fn fetch(&self) -> Result<Vec<Story>>;
}

/// GET a URL with a retry-sleep loop, backing off one extra second per
/// attempt. Returns the response body on the first 2xx.
pub(crate) async fn fetch_with_retries(
    client: &reqwest::Client,
    url: &str,
    retries: usize,
) -> Result<String> {
    let mut last_error = String::new();

    for attempt in 0..retries {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return response.text().await.map_err(|e| {
                    SendeError::Source(format!("failed to read body from {}: {}", url, e))
                });
            }
            Ok(response) => last_error = format!("HTTP {}", response.status()),
            Err(e) => last_error = e.to_string(),
        }
        debug!("Retrying {} after attempt {}: {}", url, attempt + 1, last_error);
        tokio::time::sleep(Duration::from_secs(1 + attempt as u64)).await;
    }

    Err(SendeError::Source(format!(
        "giving up on {} after {} attempts: {}",
        url, retries, last_error
    )))
}
