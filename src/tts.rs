//! Text-to-speech client.
//!
//! Talks to a self-hosted speak endpoint. Batch synthesis fans out over a
//! bounded worker pool; completions arrive in arbitrary order, so results
//! are keyed by segment name and individual failures never abort the batch.

use crate::config::TtsSettings;
use crate::error::{Result, SendeError};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Responses smaller than this cannot be a usable WAV.
const MIN_WAV_SIZE_BYTES: usize = 1000;

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    voice: &'a str,
    timeout: u64,
}

/// Outcome of one parallel synthesis batch.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// WAV paths for segments that succeeded, in original segment order.
    pub wav_files: Vec<PathBuf>,
    /// Per-segment errors, keyed by segment name.
    pub failures: BTreeMap<String, String>,
}

/// Client for the speak endpoint.
pub struct TtsClient {
    client: reqwest::Client,
    url: String,
    voice: String,
    max_concurrent: usize,
}

impl TtsClient {
    pub fn new(settings: &TtsSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .map_err(|e| SendeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            voice: settings.voice.clone(),
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    /// Synthesize one segment to a WAV file.
    pub async fn synthesize(&self, text: &str, output_path: &Path) -> Result<()> {
        let prepared = prepare_text(text);
        let response = self
            .client
            .post(&self.url)
            .json(&SpeakRequest {
                text: &prepared,
                voice: &self.voice,
                timeout: 0,
            })
            .send()
            .await
            .map_err(|e| SendeError::Tts(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(100).collect();
            return Err(SendeError::Tts(format!("HTTP {}: {}", status, snippet)));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| SendeError::Tts(format!("failed to read response: {}", e)))?;
        validate_wav(&data).map_err(SendeError::Tts)?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, &data).await?;
        Ok(())
    }

    /// Synthesize all segments with a bounded worker pool.
    ///
    /// Segments that fail are reported in the outcome's `failures` map; the
    /// rest still produce WAV files.
    #[instrument(skip(self, segments), fields(count = segments.len()))]
    pub async fn synthesize_all(
        &self,
        segments: &[(String, String)],
        output_dir: &Path,
    ) -> Result<SynthesisOutcome> {
        tokio::fs::create_dir_all(output_dir).await?;

        let pb = ProgressBar::new(segments.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} TTS   [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let mut completed: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut failures: BTreeMap<String, String> = BTreeMap::new();

        let mut tasks = stream::iter(segments.iter().cloned())
            .map(|(name, text)| {
                let wav_path = output_dir.join(format!("{}.wav", name));
                async move {
                    let result = self.synthesize(&text, &wav_path).await;
                    (name, wav_path, result)
                }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((name, wav_path, result)) = tasks.next().await {
            pb.inc(1);
            match result {
                Ok(()) => {
                    completed.insert(name, wav_path);
                }
                Err(e) => {
                    warn!("Synthesis failed for segment {}: {}", name, e);
                    failures.insert(name, e.to_string());
                }
            }
        }

        pb.finish_and_clear();

        // Reassemble in original segment order, not completion order.
        let wav_files = segments
            .iter()
            .filter_map(|(name, _)| completed.get(name).cloned())
            .collect();

        info!(
            "Synthesized {} segments, {} failures",
            completed.len(),
            failures.len()
        );
        Ok(SynthesisOutcome { wav_files, failures })
    }
}

/// Pad text so the voice does not clip the first and last words.
pub fn prepare_text(text: &str) -> String {
    let mut text = text.trim().to_string();
    if !text.starts_with('—') {
        text = format!("— {}", text);
    }
    if !text.ends_with('—') {
        text = format!("{} —", text);
    }
    text
}

/// Check that response bytes look like a usable WAV file.
pub fn validate_wav(data: &[u8]) -> std::result::Result<(), String> {
    if data.is_empty() {
        return Err("empty response".to_string());
    }
    if data.len() < MIN_WAV_SIZE_BYTES {
        return Err(format!("too small ({} bytes)", data.len()));
    }
    if &data[..4] != b"RIFF" {
        return Err("invalid WAV header".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_text_pads_both_ends() {
        assert_eq!(prepare_text("hello world"), "— hello world —");
        assert_eq!(prepare_text("  hello  "), "— hello —");
        // Already-padded text is left alone.
        assert_eq!(prepare_text("— hello —"), "— hello —");
    }

    #[test]
    fn test_validate_wav() {
        assert_eq!(validate_wav(&[]), Err("empty response".to_string()));
        assert!(validate_wav(b"RIFF").unwrap_err().starts_with("too small"));

        let mut too_small = vec![0u8; 100];
        too_small[..4].copy_from_slice(b"RIFF");
        assert!(validate_wav(&too_small).is_err());

        let mut not_wav = vec![0u8; 2000];
        not_wav[..4].copy_from_slice(b"HTML");
        assert_eq!(validate_wav(&not_wav), Err("invalid WAV header".to_string()));

        let mut good = vec![0u8; 2000];
        good[..4].copy_from_slice(b"RIFF");
        assert_eq!(validate_wav(&good), Ok(()));
    }
}
