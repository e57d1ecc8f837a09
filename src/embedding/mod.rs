//! Embedding generation for the story archive.
//!
//! Two backends: a local model (default) and the OpenAI API (opt-in).
//! The backend is selected once per process when the embedder is built.

mod local;
mod openai;

pub use local::LocalEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Fixed embedding dimensionality shared by the store schema and both backends.
pub const EMBEDDING_DIM: usize = 1024;

/// Trait for embedding generation.
///
/// Output vectors are unit length; similarity search relies on this.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    /// An empty input yields an empty output.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Construct the embedding backend selected in settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
        )?)),
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::from_env(
            &settings.openai_model,
            settings.dimensions as usize,
        )?)),
    }
}

/// Scale a vector to unit length in place. Zero vectors are left unchanged.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
