//! Configuration module for Sende.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingProvider, EmbeddingSettings, EpisodeSettings, GeneralSettings, Settings,
    SourceSettings, StorageSettings, TtsSettings,
};
