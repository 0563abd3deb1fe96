//! Vector storage
//!
//! This module provides persistent, named collections of embedded chunks:
//! - A trait for storage backends (embedded SQLite, Qdrant)
//! - Collections bound to the embedder that produced their vectors
//! - Nearest-neighbour retrieval by query text

mod qdrant;
mod sqlite;

pub use qdrant::*;
pub use sqlite::*;

use crate::chunk::Chunk;
use crate::config::{Config, StoreBackendKind};
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// A record as handed to a backend: chunk fields plus its vector
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub vector: Vec<f32>,
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub source: String,
    /// Cosine similarity, higher is closer
    pub score: f32,
}

/// Storage backend for collections
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Create the collection if absent. An existing collection must have
    /// been created with the same dimension and embedding model.
    async fn ensure_collection(&self, name: &str, dimension: usize, model: &str) -> Result<()>;

    /// Store all records or none. Any id already present in the collection,
    /// or repeated within the batch, fails the whole batch.
    async fn insert(&self, collection: &str, records: Vec<StoredChunk>) -> Result<()>;

    /// The `limit` records most similar to `vector`, best first
    async fn search(&self, collection: &str, vector: &[f32], limit: usize)
        -> Result<Vec<SearchHit>>;

    /// Number of stored records
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Short backend name for status output
    fn kind(&self) -> &'static str;
}

/// Entry point to the configured backend
#[derive(Clone)]
pub struct VectorStore {
    backend: Arc<dyn VectorBackend>,
    batch_size: usize,
}

impl VectorStore {
    pub fn new(backend: Arc<dyn VectorBackend>, batch_size: usize) -> Self {
        Self {
            backend,
            batch_size,
        }
    }

    /// Open the backend selected by `store.backend`
    pub async fn open(config: &Config) -> Result<Self> {
        let backend: Arc<dyn VectorBackend> = match config.store.backend {
            StoreBackendKind::Sqlite => {
                Arc::new(SqliteVectorStore::open(&config.paths.vectors_db).await?)
            }
            StoreBackendKind::Qdrant => Arc::new(QdrantStore::new(&config.store.qdrant_url)?),
        };
        info!("Using {} vector store", backend.kind());
        Ok(Self::new(backend, config.embedding.batch_size))
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Open `name`, creating it bound to `embedder` when it does not exist
    pub async fn get_or_create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Collection> {
        self.backend
            .ensure_collection(name, embedder.dimension(), embedder.model_name())
            .await?;
        debug!("Collection {} ready", name);

        Ok(Collection {
            name: name.to_string(),
            embedder,
            backend: self.backend.clone(),
            batch_size: self.batch_size,
        })
    }
}

/// A named collection with its bound embedder
#[derive(Clone)]
pub struct Collection {
    name: String,
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn VectorBackend>,
    batch_size: usize,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Embed and store chunks. Returns the number stored.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut seen = HashSet::with_capacity(chunks.len());
        if let Some(dup) = chunks.iter().find(|c| !seen.insert(c.id)) {
            return Err(Error::Store(format!(
                "Duplicate chunk id {} in batch for collection '{}'",
                dup.id, self.name
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), texts, self.batch_size).await?;

        let records: Vec<StoredChunk> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredChunk {
                id: chunk.id.to_string(),
                text: chunk.text.clone(),
                source: chunk.metadata.source.clone(),
                vector,
            })
            .collect();

        let stored = records.len();
        self.backend.insert(&self.name, records).await?;
        debug!("Stored {} chunks in {}", stored, self.name);
        Ok(stored)
    }

    /// The `top_n` stored chunks most similar to `text`
    pub async fn query(&self, text: &str, top_n: usize) -> Result<Vec<SearchHit>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(vec![text.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("No vector returned for query".to_string()))?;

        self.backend.search(&self.name, &vector, top_n).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.backend.count(&self.name).await
    }
}

/// Cosine similarity between two vectors of equal length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_text;
    use crate::embed::testing::HashEmbedder;
    use tempfile::TempDir;

    async fn sqlite_store(tmp: &TempDir) -> VectorStore {
        let backend = SqliteVectorStore::open(&tmp.path().join("vectors.db"))
            .await
            .unwrap();
        VectorStore::new(Arc::new(backend), 8)
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_with_exact_text_returns_chunk() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        let collection = store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::new(64)))
            .await
            .unwrap();

        let mut chunks = chunk_text("Paris is the capital of France.", "doc1.txt", 1000, 200)
            .unwrap();
        chunks.extend(
            chunk_text("Rust has a borrow checker.", "doc2.txt", 1000, 200).unwrap(),
        );
        chunks.extend(chunk_text("Tokio runs async tasks.", "doc3.txt", 1000, 200).unwrap());
        assert_eq!(collection.add(&chunks).await.unwrap(), 3);

        let hits = collection
            .query("Rust has a borrow checker.", 3)
            .await
            .unwrap();
        assert_eq!(hits[0].id, chunks[1].id.to_string());
        assert_eq!(hits[0].source, "doc2.txt");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_empty_collection_query_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        let collection = store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::new(16)))
            .await
            .unwrap();

        assert!(collection.query("anything", 3).await.unwrap().is_empty());
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_batch_rejected_before_embedding() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        let embedder = Arc::new(HashEmbedder::new(16));
        let collection = store
            .get_or_create_collection("documents_test", embedder.clone())
            .await
            .unwrap();

        let chunks = chunk_text("One. Two.", "d.txt", 1000, 0).unwrap();
        let doubled = vec![chunks[0].clone(), chunks[0].clone()];

        let err = collection.add(&doubled).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_readding_same_chunks_rejected_atomically() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        let collection = store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::new(16)))
            .await
            .unwrap();

        let first = chunk_text("Alpha.", "a.txt", 1000, 0).unwrap();
        collection.add(&first).await.unwrap();

        let mut second = chunk_text("Beta.", "b.txt", 1000, 0).unwrap();
        second.push(first[0].clone());

        let err = collection.add(&second).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(collection.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_stores_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        let embedder = Arc::new(HashEmbedder::new(16));
        let collection = store
            .get_or_create_collection("documents_test", embedder.clone())
            .await
            .unwrap();

        embedder.set_failing(true);
        let chunks = chunk_text("Gamma.", "g.txt", 1000, 0).unwrap();
        assert!(matches!(
            collection.add(&chunks).await,
            Err(Error::Embedding(_))
        ));

        embedder.set_failing(false);
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_collection_bound_to_embedder() {
        let tmp = TempDir::new().unwrap();
        let store = sqlite_store(&tmp).await;
        store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::named("a", 16)))
            .await
            .unwrap();

        // Same identity reopens fine
        store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::named("a", 16)))
            .await
            .unwrap();

        let err = match store
            .get_or_create_collection("documents_test", Arc::new(HashEmbedder::named("b", 32)))
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected a store error"),
        };
        assert!(matches!(err, Error::Store(_)));
    }
}
