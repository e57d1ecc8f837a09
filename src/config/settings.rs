//! Configuration settings for Sende.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub sources: SourceSettings,
    pub embedding: EmbeddingSettings,
    pub storage: StorageSettings,
    pub tts: TtsSettings,
    pub episode: EpisodeSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.sende".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Story source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Subreddits scraped for the daily episode.
    pub subreddits: Vec<String>,
    /// Posts fetched per subreddit.
    pub reddit_limit: usize,
    /// Trending alphaXiv threads fetched per run.
    pub alphaxiv_limit: usize,
    /// Luminary posts fetched per run.
    pub luminary_limit: usize,
    /// User-Agent header sent with scraping requests.
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            subreddits: vec![
                "singularity".to_string(),
                "LocalLLaMA".to_string(),
                "Accelerate".to_string(),
            ],
            reddit_limit: 2,
            alphaxiv_limit: 2,
            luminary_limit: 1,
            user_agent: "sende/0.1 (news scraper)".to_string(),
        }
    }
}

/// Embedding backend selection.
///
/// Chosen once per process when the embedder is constructed, never per call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local embedding model (default).
    #[default]
    Local,
    /// OpenAI embedding API (opt-in, requires OPENAI_API_KEY).
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingProvider::Local),
            "openai" | "remote" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Local => write!(f, "local"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding backend (local, openai).
    pub provider: EmbeddingProvider,
    /// Local model name.
    pub model: String,
    /// Remote model name (openai provider).
    pub openai_model: String,
    /// Embedding dimensions; must match the store schema constant.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            model: "bge-large-en-v1.5".to_string(),
            openai_model: "text-embedding-3-large".to_string(),
            dimensions: 1024,
        }
    }
}

/// Story and episode archive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path to the SQLite archive database.
    pub db_path: String,
    /// Directory for the JSON flat-file fallback store.
    pub fallback_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: "~/.sende/archive.db".to_string(),
            fallback_dir: "~/.sende/fallback".to_string(),
        }
    }
}

/// Text-to-speech service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Speak endpoint URL.
    pub url: String,
    /// Voice name sent with each request.
    pub voice: String,
    /// Maximum concurrent synthesis requests.
    pub max_concurrent: usize,
    /// Per-request timeout in seconds (synthesis is slow).
    pub request_timeout_seconds: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_seconds: u64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7849/speak".to_string(),
            voice: "astrid".to_string(),
            max_concurrent: 12,
            request_timeout_seconds: 3600,
            connect_timeout_seconds: 10,
        }
    }
}

/// Episode assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeSettings {
    /// Show name spoken in the intro.
    pub show_name: String,
    /// Tagline spoken after the show name.
    pub tagline: String,
    /// Directory episode outputs are written under (one subdir per date).
    pub output_dir: String,
    /// Silence inserted between stitched segments, in seconds.
    pub silence_seconds: f64,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            show_name: "Sende".to_string(),
            tagline: "daily signals from the AI frontier".to_string(),
            output_dir: "~/.sende/episodes".to_string(),
            silence_seconds: 1.0,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SendeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sende")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn db_path(&self) -> PathBuf {
        Self::expand_path(&self.storage.db_path)
    }

    /// Get the expanded fallback store directory.
    pub fn fallback_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.fallback_dir)
    }

    /// Get the expanded episode output directory.
    pub fn episodes_dir(&self) -> PathBuf {
        Self::expand_path(&self.episode.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.sources.subreddits = vec!["MachineLearning".to_string()];
        settings.tts.max_concurrent = 4;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.sources.subreddits, vec!["MachineLearning"]);
        assert_eq!(loaded.tts.max_concurrent, 4);
        assert_eq!(loaded.embedding.provider, EmbeddingProvider::Local);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/sende/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.embedding.dimensions, 1024);
        assert_eq!(settings.tts.max_concurrent, 12);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.general.log_level, "debug");
        assert_eq!(settings.episode.show_name, "Sende");
    }
}
