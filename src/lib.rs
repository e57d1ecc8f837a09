//! Sende - Daily AI News Episodes
//!
//! A CLI tool that assembles a daily audio news episode from scraped
//! stories and keeps a vector-searchable archive of everything it has seen.
//!
//! The name "Sende" comes from the Norwegian word for "broadcast."
//!
//! # Overview
//!
//! Sende allows you to:
//! - Collect stories from Reddit, alphaXiv, and luminary feeds
//! - Generate per-story scripts and stitch them into an episode
//! - Synthesize episode audio through a self-hosted TTS service
//! - Archive stories with embedding-based dedup and search them semantically
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `story` - Story and provenance data model
//! - `sources` - Story fetchers (Reddit, alphaXiv, luminary)
//! - `script` - Script templates and segment naming
//! - `embedding` - Embedding generation (local model or OpenAI)
//! - `store` - Vector-searchable archive with flat-file fallback
//! - `episode` - Episode output files
//! - `tts` - Text-to-speech client
//! - `audio` - Audio assembly (stubbed)
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use sende::config::Settings;
//! use sende::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Assemble today's episode from stubbed sources.
//!     let date = chrono::Local::now().date_naive();
//!     let result = orchestrator.run_episode(date, false, true).await?;
//!     println!("Wrote {} segments", result.segment_count);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod episode;
pub mod error;
pub mod orchestrator;
pub mod script;
pub mod sources;
pub mod store;
pub mod story;
pub mod tts;

pub use error::{Result, SendeError};
