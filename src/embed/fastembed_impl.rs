//! Built-in local embedding model

use super::{validate_dimensions, Embedder};
use crate::error::{Error, Result};
use crate::models::EmbeddingModelKey;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const BUILTIN_MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// all-MiniLM-L6-v2 running in process through ONNX Runtime
pub struct FastEmbedder {
    inner: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the model, downloading it into `cache_dir` on first use
    pub fn new(cache_dir: &Path) -> Result<Self> {
        info!("Loading built-in embedding model {}", BUILTIN_MODEL_NAME);

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(true);
        let inner = TextEmbedding::try_new(options).map_err(|e| {
            Error::Setup(format!(
                "Could not load {} from {}: {}",
                BUILTIN_MODEL_NAME,
                cache_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            dimension: EmbeddingModelKey::Chroma.dimensions(),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts locally", texts.len());

        // Inference is CPU-bound and blocking
        let inner = Arc::clone(&self.inner);
        let vectors = tokio::task::spawn_blocking(move || inner.blocking_lock().embed(texts, None))
            .await
            .map_err(|e| Error::Embedding(format!("Local embedding task panicked: {}", e)))?
            .map_err(|e| Error::Embedding(format!("Local embedding failed: {}", e)))?;

        validate_dimensions(self, &vectors)?;
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        BUILTIN_MODEL_NAME
    }
}
