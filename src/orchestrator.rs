//! Pipeline orchestrator for Sende.
//!
//! Coordinates the daily run: collect stories, generate scripts, write the
//! episode directory, and archive everything with a flat-file fallback.

use crate::audio;
use crate::config::Settings;
use crate::embedding::{create_embedder, Embedder};
use crate::episode::{self, EpisodeManifest};
use crate::error::{Result, SendeError};
use crate::script::{ScriptWriter, Segment};
use crate::sources::{AlphaxivSource, LuminarySource, RedditSource, StorySource};
use crate::store::{BatchOutcome, FallbackStore, ScoredStory, StoryStore};
use crate::story::Story;
use crate::tts::TtsClient;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Where the archive writes landed for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOutcome {
    /// Vector store path succeeded.
    Primary(BatchOutcome),
    /// Vector store unavailable; flat-file fallback used.
    Fallback,
    /// Storage disabled for this run.
    Skipped,
}

/// Result of assembling one episode.
#[derive(Debug)]
pub struct EpisodeRunResult {
    pub episode_dir: PathBuf,
    pub story_count: usize,
    pub segment_count: usize,
    pub storage: StorageOutcome,
}

/// Result of generating audio for one episode.
#[derive(Debug)]
pub struct AudioRunResult {
    pub mp3_path: PathBuf,
    pub synthesized: usize,
    pub failures: BTreeMap<String, String>,
}

/// The main orchestrator for the Sende pipeline.
pub struct Orchestrator {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
}

impl Orchestrator {
    /// Create an orchestrator with the configured embedding backend.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder = create_embedder(&settings.embedding)?;
        Ok(Self { settings, embedder })
    }

    /// Create an orchestrator with a custom embedder.
    pub fn with_embedder(settings: Settings, embedder: Arc<dyn Embedder>) -> Self {
        Self { settings, embedder }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Open the primary story archive.
    pub fn open_store(&self) -> Result<StoryStore> {
        StoryStore::open(&self.settings.db_path(), self.embedder.clone())
    }

    /// Assemble one episode: collect stories, generate scripts, write the
    /// episode directory, and archive stories plus the episode record.
    #[instrument(skip(self), fields(date = %episode_date))]
    pub async fn run_episode(
        &self,
        episode_date: NaiveDate,
        live: bool,
        store: bool,
    ) -> Result<EpisodeRunResult> {
        let stories = self.collect_stories(live).await?;
        info!("Collected {} stories", stories.len());

        let writer = ScriptWriter::new(
            &self.settings.episode.show_name,
            &self.settings.episode.tagline,
        );
        let scripts = writer.story_scripts(&stories);

        let mut segments: Vec<(String, String)> =
            vec![(Segment::Intro.file_stem(), writer.intro(episode_date))];
        for (idx, script) in scripts.iter().enumerate() {
            let num = idx + 1;
            segments.push((Segment::Script(num).file_stem(), script.clone()));
            if num < scripts.len() {
                segments.push((
                    Segment::Interstitial(num, num + 1).file_stem(),
                    writer.interstitial(script, &scripts[idx + 1]),
                ));
            }
        }
        segments.push((Segment::Outro.file_stem(), writer.outro()));

        let episode_dir = self.settings.episodes_dir().join(episode_date.to_string());
        let episode_text = episode::write_episode_outputs(&episode_dir, &segments)?;

        let manifest = EpisodeManifest {
            episode_date: episode_date.to_string(),
            story_count: stories.len(),
            segments: segments.iter().map(|(name, _)| name.clone()).collect(),
        };
        episode::write_manifest(&episode_dir, &manifest)?;
        info!("Wrote {} segments to {:?}", segments.len(), episode_dir);

        let storage = if store {
            self.archive(&stories, episode_date, &episode_text, &manifest)
                .await?
        } else {
            StorageOutcome::Skipped
        };

        Ok(EpisodeRunResult {
            episode_dir,
            story_count: stories.len(),
            segment_count: segments.len(),
            storage,
        })
    }

    /// Collect stories from all configured sources. A failing source is
    /// logged and skipped so one bad feed does not sink the daily run.
    async fn collect_stories(&self, live: bool) -> Result<Vec<Story>> {
        let cfg = &self.settings.sources;
        let fetchers: Vec<Box<dyn StorySource>> = vec![
            Box::new(RedditSource::new(
                cfg.subreddits.clone(),
                cfg.reddit_limit,
                &cfg.user_agent,
                live,
            )?),
            Box::new(AlphaxivSource::new(cfg.alphaxiv_limit, &cfg.user_agent, live)?),
            Box::new(LuminarySource::new(cfg.luminary_limit, live)),
        ];

        let mut stories = Vec::new();
        for fetcher in &fetchers {
            match fetcher.fetch().await {
                Ok(batch) => {
                    info!("{}: {} stories", fetcher.name(), batch.len());
                    stories.extend(batch);
                }
                Err(e) => warn!("Skipping {} stories: {}", fetcher.name(), e),
            }
        }
        Ok(stories)
    }

    /// Archive stories and the episode record. The vector-store path is
    /// attempted first; only `StorageUnavailable` triggers the flat-file
    /// fallback, and both writes are re-issued against it.
    async fn archive(
        &self,
        stories: &[Story],
        episode_date: NaiveDate,
        episode_text: &str,
        manifest: &EpisodeManifest,
    ) -> Result<StorageOutcome> {
        match self
            .archive_primary(stories, episode_date, episode_text, manifest)
            .await
        {
            Ok(outcome) => Ok(StorageOutcome::Primary(outcome)),
            Err(SendeError::StorageUnavailable(reason)) => {
                warn!("Vector store unavailable ({}), using flat-file fallback", reason);
                let fallback = FallbackStore::new(&self.settings.fallback_dir());
                fallback.store_stories_batch(stories, episode_date)?;
                fallback.store_episode(episode_date, episode_text, manifest)?;
                Ok(StorageOutcome::Fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn archive_primary(
        &self,
        stories: &[Story],
        episode_date: NaiveDate,
        episode_text: &str,
        manifest: &EpisodeManifest,
    ) -> Result<BatchOutcome> {
        let store = self.open_store()?;
        let outcome = store.store_stories_batch(stories, episode_date, true).await?;
        store.store_episode(episode_date, episode_text, manifest).await?;
        Ok(outcome)
    }

    /// Synthesize and assemble audio for an existing episode directory.
    #[instrument(skip(self), fields(dir = %episode_dir.display()))]
    pub async fn generate_audio(&self, episode_dir: &Path) -> Result<AudioRunResult> {
        let segments = episode::read_segments(episode_dir)?;
        if segments.is_empty() {
            return Err(SendeError::InvalidInput(format!(
                "No segment files under {}",
                episode_dir.display()
            )));
        }

        let tts = TtsClient::new(&self.settings.tts)?;
        let outcome = tts.synthesize_all(&segments, &episode_dir.join("audio")).await?;

        if outcome.wav_files.is_empty() {
            return Err(SendeError::Tts(format!(
                "synthesis failed for all {} segments",
                segments.len()
            )));
        }
        for (name, reason) in &outcome.failures {
            warn!("Segment {} missing from episode audio: {}", name, reason);
        }

        let wav_path = episode_dir.join("episode.wav");
        audio::stitch_wavs(
            &outcome.wav_files,
            &wav_path,
            self.settings.episode.silence_seconds,
        )?;
        let mp3_path = episode_dir.join("episode.mp3");
        audio::transcode_to_mp3(&wav_path, &mp3_path, "128k")?;

        // Publishing companions alongside the audio.
        let episode_text =
            std::fs::read_to_string(episode_dir.join(episode::EPISODE_FILE)).unwrap_or_default();
        episode::write_transcript(episode_dir, &episode_text)?;
        let segment_names: Vec<String> = segments.iter().map(|(name, _)| name.clone()).collect();
        episode::write_chapters(episode_dir, &segment_names)?;

        Ok(AudioRunResult {
            mp3_path,
            synthesized: outcome.wav_files.len(),
            failures: outcome.failures,
        })
    }

    /// Semantic search over the story archive.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredStory>> {
        let store = self.open_store()?;
        store.search_stories(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = root.join("data").display().to_string();
        settings.storage.db_path = root.join("archive.db").display().to_string();
        settings.storage.fallback_dir = root.join("fallback").display().to_string();
        settings.episode.output_dir = root.join("episodes").display().to_string();
        settings
    }

    #[tokio::test]
    async fn test_stub_run_writes_episode_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(test_settings(dir.path())).unwrap();
        let episode_date: NaiveDate = "2026-02-04".parse().unwrap();

        let result = orchestrator
            .run_episode(episode_date, false, false)
            .await
            .unwrap();

        assert_eq!(result.storage, StorageOutcome::Skipped);
        assert!(result.story_count > 0);
        assert!(result.episode_dir.join("episode.txt").exists());
        assert!(result.episode_dir.join("manifest.json").exists());
        assert!(result.episode_dir.join("00_-_intro.txt").exists());
        assert!(result.episode_dir.join("20_-_outro.txt").exists());

        let manifest: EpisodeManifest = serde_json::from_str(
            &std::fs::read_to_string(result.episode_dir.join("manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.episode_date, "2026-02-04");
        assert_eq!(manifest.story_count, result.story_count);
        assert_eq!(manifest.segments.len(), result.segment_count);
    }

    #[tokio::test]
    async fn test_unavailable_store_falls_back_to_flat_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        // Point the database under a regular file so it cannot be opened.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        settings.storage.db_path = blocker.join("sub").join("archive.db").display().to_string();

        let orchestrator = Orchestrator::new(settings).unwrap();
        let result = orchestrator
            .run_episode("2026-02-04".parse().unwrap(), false, true)
            .await
            .unwrap();

        assert_eq!(result.storage, StorageOutcome::Fallback);

        // The fallback snapshot holds exactly this run's stories.
        let stories_json = dir.path().join("fallback").join("stories.json");
        let snapshot: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(stories_json).unwrap()).unwrap();
        assert_eq!(
            snapshot["stories"].as_array().unwrap().len(),
            result.story_count
        );
        assert!(dir.path().join("fallback").join("episodes.json").exists());
    }
}
