//! JSON flat-file fallback store.
//!
//! Used when the SQLite archive cannot be opened. No deduplication and no
//! embeddings: each call serializes the whole batch and fully overwrites
//! the target file. The orchestrator invokes this only after catching
//! `StorageUnavailable` from the primary path.

use crate::episode::EpisodeManifest;
use crate::error::Result;
use crate::story::Story;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const STORIES_FILE: &str = "stories.json";
const EPISODES_FILE: &str = "episodes.json";

/// Contents of `stories.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoriesSnapshot {
    pub episode_date: String,
    pub stories: Vec<Story>,
}

/// Contents of `episodes.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub episode_date: String,
    pub episode_text: String,
    pub manifest: EpisodeManifest,
}

/// Flat-file store writing one JSON file per entity kind.
pub struct FallbackStore {
    dir: PathBuf,
}

impl FallbackStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Write the full story batch, replacing any previous snapshot.
    #[instrument(skip(self, stories), fields(count = stories.len()))]
    pub fn store_stories_batch(&self, stories: &[Story], episode_date: NaiveDate) -> Result<()> {
        let snapshot = StoriesSnapshot {
            episode_date: episode_date.to_string(),
            stories: stories.to_vec(),
        };
        self.write_json(STORIES_FILE, &snapshot)?;
        info!("Wrote {} stories to fallback store", stories.len());
        Ok(())
    }

    /// Write the episode record, replacing any previous snapshot.
    #[instrument(skip(self, episode_text, manifest))]
    pub fn store_episode(
        &self,
        episode_date: NaiveDate,
        episode_text: &str,
        manifest: &EpisodeManifest,
    ) -> Result<()> {
        let snapshot = EpisodeSnapshot {
            episode_date: episode_date.to_string(),
            episode_text: episode_text.to_string(),
            manifest: manifest.clone(),
        };
        self.write_json(EPISODES_FILE, &snapshot)?;
        info!("Wrote episode record for {} to fallback store", episode_date);
        Ok(())
    }

    /// Read back the story snapshot, if one exists.
    pub fn load_stories(&self) -> Result<Option<StoriesSnapshot>> {
        let path = self.dir.join(STORIES_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(self.dir.join(file_name), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{Source, SourceMeta};

    fn story(id: &str) -> Story {
        Story {
            id: id.to_string(),
            title: "A title".to_string(),
            summary: "A summary".to_string(),
            source_url: format!("https://example.com/{}", id),
            source_meta: SourceMeta::new(Source::Luminary),
            raw_text: String::new(),
            tags: vec![],
        }
    }

    #[test]
    fn test_stories_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path());

        store
            .store_stories_batch(&[story("a"), story("b")], "2026-02-04".parse().unwrap())
            .unwrap();

        let snapshot = store.load_stories().unwrap().unwrap();
        assert_eq!(snapshot.episode_date, "2026-02-04");
        assert_eq!(snapshot.stories.len(), 2);
        assert_eq!(snapshot.stories[0].id, "a");
    }

    #[test]
    fn test_snapshot_is_overwritten_not_merged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path());

        store
            .store_stories_batch(&[story("a"), story("b")], "2026-02-04".parse().unwrap())
            .unwrap();
        store
            .store_stories_batch(&[story("c")], "2026-02-05".parse().unwrap())
            .unwrap();

        let snapshot = store.load_stories().unwrap().unwrap();
        assert_eq!(snapshot.episode_date, "2026-02-05");
        assert_eq!(snapshot.stories.len(), 1);
        assert_eq!(snapshot.stories[0].id, "c");
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path());
        assert!(store.load_stories().unwrap().is_none());
    }

    #[test]
    fn test_episode_snapshot_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path());
        let manifest = EpisodeManifest {
            episode_date: "2026-02-04".to_string(),
            story_count: 2,
            segments: vec!["00_-_intro".to_string(), "20_-_outro".to_string()],
        };

        store
            .store_episode("2026-02-04".parse().unwrap(), "the episode", &manifest)
            .unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("episodes.json")).unwrap();
        let snapshot: EpisodeSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(snapshot.episode_text, "the episode");
        assert_eq!(snapshot.manifest.story_count, 2);
    }
}
