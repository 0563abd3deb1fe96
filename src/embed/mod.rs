//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - An OpenAI-compatible HTTP backend (hosted OpenAI and local nomic)
//! - A built-in local model via FastEmbed (behind the `local-embed` feature)
//! - Batch processing for efficiency

mod openai;

#[cfg(feature = "local-embed")]
mod fastembed_impl;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use openai::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::EmbeddingModelKey;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text in input order
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create the embedder selected by `key`.
///
/// Construction failures (missing key, unusable endpoint, model load failure)
/// are setup errors; the caller cannot run any pipeline action without one.
pub fn create_embedder(key: EmbeddingModelKey, config: &Config) -> Result<Arc<dyn Embedder>> {
    debug!("Creating embedder for {}", key);
    match key {
        EmbeddingModelKey::OpenAi | EmbeddingModelKey::Nomic => {
            Ok(Arc::new(OpenAiEmbedder::from_config(key, config)?))
        }
        #[cfg(feature = "local-embed")]
        EmbeddingModelKey::Chroma => Ok(Arc::new(FastEmbedder::new(
            &config.paths.base_dir.join("models"),
        )?)),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingModelKey::Chroma => Err(Error::Setup(
            "The built-in embedding model requires the `local-embed` feature".to_string(),
        )),
    }
}

/// Helper to embed in batches
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let batch_texts: Vec<String> = chunk.to_vec();
        let embeddings = embedder.embed(batch_texts).await?;
        all_embeddings.extend(embeddings);
    }

    validate_dimensions(embedder, &all_embeddings)?;
    Ok(all_embeddings)
}

/// Check that every vector has the embedder's declared dimension
pub fn validate_dimensions(embedder: &dyn Embedder, embeddings: &[Vec<f32>]) -> Result<()> {
    if let Some(mismatch) = embeddings
        .iter()
        .find(|vec| vec.len() != embedder.dimension())
    {
        return Err(Error::Embedding(format!(
            "Embedding dimension mismatch for model '{}': expected {}, got {}",
            embedder.model_name(),
            embedder.dimension(),
            mismatch.len()
        )));
    }
    Ok(())
}
