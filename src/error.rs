//! Error types for Sende.

use thiserror::Error;

/// Library-level error type for Sende operations.
#[derive(Error, Debug)]
pub enum SendeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Story source error: {0}")]
    Source(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding configuration error: {0}")]
    EmbeddingConfig(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Sende operations.
pub type Result<T> = std::result::Result<T, SendeError>;
