//! Local embedding model backend.

use super::{l2_normalize, Embedder};
use crate::error::{Result, SendeError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Embedder backed by a local model.
///
/// The model is loaded lazily on first use and cached for the lifetime of
/// the process; embedding runs on the blocking thread pool.
pub struct LocalEmbedder {
    model: OnceCell<Arc<TextEmbedding>>,
    model_name: EmbeddingModel,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Create a local embedder with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("bge-large-en-v1.5", 1024)
    }

    /// Create a local embedder with a specific model and dimensions.
    pub fn with_config(model: &str, dimensions: usize) -> Result<Self> {
        let model_name = match model.to_lowercase().as_str() {
            "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
            "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
            other => {
                return Err(SendeError::EmbeddingConfig(format!(
                    "Unknown local embedding model: {}",
                    other
                )))
            }
        };

        Ok(Self {
            model: OnceCell::new(),
            model_name,
            dimensions,
        })
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>> {
        self.model
            .get_or_try_init(|| async {
                let name = self.model_name.clone();
                info!("Loading embedding model {:?}", name);
                let model = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(
                        InitOptions::new(name).with_show_download_progress(true),
                    )
                })
                .await
                .map_err(|e| SendeError::Embedding(format!("Model load task failed: {}", e)))?
                .map_err(|e| SendeError::Embedding(format!("Failed to load model: {}", e)))?;
                info!("Embedding model loaded");
                Ok(Arc::new(model))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SendeError::Embedding("Empty embedding batch".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let model = self.model().await?;
        let owned: Vec<String> = texts.to_vec();
        let mut embeddings = tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| SendeError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| SendeError::Embedding(e.to_string()))?;

        for embedding in &mut embeddings {
            l2_normalize(embedding);
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
