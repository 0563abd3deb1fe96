//! Ingestion and question answering over one embedding model
//!
//! A [`Session`] owns the active model selection, the collection for that
//! embedding model, and the set of documents already stored in it. Each
//! document moves through `Uploaded -> Extracted -> Chunked -> Stored`, or
//! stops in a failed state that records the last stage it reached.

use crate::chunk::{compute_content_hash, Chunker};
use crate::config::Config;
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, ErrorKind, Result};
use crate::generate::{create_generator, Generator};
use crate::meta::{MetaDb, ProcessedDocument};
use crate::models::{EmbeddingModelDescriptor, EmbeddingModelKey, LlmModelDescriptor, LlmModelKey};
use crate::parse::{extract_text, Document};
use crate::store::{Collection, SearchHit, VectorStore};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Processing stage of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Uploaded,
    Extracted,
    Chunked,
    Stored,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentState::Uploaded => "uploaded",
            DocumentState::Extracted => "extracted",
            DocumentState::Chunked => "chunked",
            DocumentState::Stored => "stored",
        };
        f.write_str(name)
    }
}

/// Result of ingesting one document
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    /// Newly stored
    Stored { name: String, chunks: usize },
    /// Already stored under the active embedding model
    Skipped { name: String },
    /// Processing stopped after `stage`
    Failed {
        name: String,
        stage: DocumentState,
        kind: ErrorKind,
        reason: String,
    },
}

impl ProcessingOutcome {
    pub fn name(&self) -> &str {
        match self {
            ProcessingOutcome::Stored { name, .. }
            | ProcessingOutcome::Skipped { name }
            | ProcessingOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessingOutcome::Failed { .. })
    }

    fn failed(name: &str, stage: DocumentState, error: Error) -> Self {
        warn!("Failed to process {} after {}: {}", name, stage, error);
        ProcessingOutcome::Failed {
            name: name.to_string(),
            stage,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// Result of asking a question
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskOutcome {
    Answered {
        answer: String,
        sources: Vec<SearchHit>,
    },
    /// Retrieval succeeded but the generation backend failed
    GenerationFailed {
        reason: String,
        sources: Vec<SearchHit>,
    },
    /// Nothing relevant was retrieved
    NoResult,
    /// No document has been processed under the active embedding model
    NoDocuments,
}

/// Status summary for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub embedding_model: EmbeddingModelDescriptor,
    pub llm_model: LlmModelDescriptor,
    pub collection: String,
    pub store_backend: String,
    pub chunk_count: usize,
    pub processed_documents: Vec<ProcessedDocument>,
}

/// The components one question or ingestion runs through
struct Pipeline {
    chunker: Chunker,
    collection: Collection,
    generator: Arc<dyn Generator>,
    top_n: usize,
}

/// An interactive session over the configured models
pub struct Session {
    embedding_model: EmbeddingModelKey,
    llm_model: LlmModelKey,
    processed: HashSet<String>,
    pipeline: Pipeline,
    store: VectorStore,
    ledger: MetaDb,
}

impl Session {
    /// Open a session for the models selected in `config`.
    ///
    /// Fails with a setup error before touching any backend when a required
    /// credential is missing.
    pub async fn open(config: &Config) -> Result<Self> {
        config.check_credentials()?;

        let embedder = create_embedder(config.embedding_model, config)?;
        let generator = create_generator(config.llm_model, config)?;
        let store = VectorStore::open(config).await?;
        let ledger = MetaDb::new(&config.paths.session_db).await?;

        Self::from_parts(config, store, ledger, embedder, generator).await
    }

    /// Assemble a session from already-built components
    pub async fn from_parts(
        config: &Config,
        store: VectorStore,
        ledger: MetaDb,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let key = config.embedding_model;

        let previous = ledger.active_embedding_model().await?;
        if previous != Some(key) {
            if let Some(previous) = previous {
                info!(
                    "Embedding model changed from {} to {}; processed documents reset",
                    previous, key
                );
            }
            ledger.clear(key).await?;
            ledger.set_active_embedding_model(key).await?;
        }

        let collection = store
            .get_or_create_collection(&key.collection_name(), embedder)
            .await?;
        let processed: HashSet<String> = ledger.processed_names(key).await?.into_iter().collect();
        debug!(
            "Session opened with {} processed documents in {}",
            processed.len(),
            collection.name()
        );

        Ok(Self {
            embedding_model: key,
            llm_model: config.llm_model,
            processed,
            pipeline: Pipeline {
                chunker: Chunker::from_config(&config.chunk)?,
                collection,
                generator,
                top_n: config.query.top_n,
            },
            store,
            ledger,
        })
    }

    pub fn embedding_model(&self) -> EmbeddingModelKey {
        self.embedding_model
    }

    pub fn llm_model(&self) -> LlmModelKey {
        self.llm_model
    }

    /// Descriptor of the active embedding model
    pub fn embedding_info(&self) -> &'static EmbeddingModelDescriptor {
        self.embedding_model.descriptor()
    }

    pub fn is_processed(&self, name: &str) -> bool {
        self.processed.contains(name)
    }

    /// Run one document through extraction, chunking and storage
    pub async fn ingest(&mut self, doc: Document) -> ProcessingOutcome {
        if self.processed.contains(&doc.name) {
            self.warn_if_changed(&doc).await;
            info!("Skipping {}: already processed", doc.name);
            return ProcessingOutcome::Skipped { name: doc.name };
        }

        let text = match extract_text(&doc) {
            Ok(text) => text,
            Err(e) => return ProcessingOutcome::failed(&doc.name, DocumentState::Uploaded, e),
        };
        debug!("{} {}: {} chars", doc.name, DocumentState::Extracted, text.chars().count());

        let chunks = self.pipeline.chunker.chunk(&text, &doc.name);
        debug!("{} {}: {} chunks", doc.name, DocumentState::Chunked, chunks.len());
        if chunks.is_empty() {
            warn!("{} has no text; nothing to store", doc.name);
        }

        let stored = match self.pipeline.collection.add(&chunks).await {
            Ok(stored) => stored,
            Err(e) => return ProcessingOutcome::failed(&doc.name, DocumentState::Chunked, e),
        };

        let hash = compute_content_hash(&doc.bytes);
        if let Err(e) = self
            .ledger
            .mark_processed(&doc.name, self.embedding_model, &hash, stored)
            .await
        {
            warn!("Stored {} but could not record it in the ledger: {}", doc.name, e);
        }
        self.processed.insert(doc.name.clone());

        info!("Stored {} ({} chunks)", doc.name, stored);
        ProcessingOutcome::Stored {
            name: doc.name,
            chunks: stored,
        }
    }

    /// Ingest documents one at a time in the given order
    pub async fn ingest_batch(&mut self, docs: Vec<Document>) -> Vec<ProcessingOutcome> {
        let mut outcomes = Vec::with_capacity(docs.len());
        for doc in docs {
            outcomes.push(self.ingest(doc).await);
        }
        outcomes
    }

    async fn warn_if_changed(&self, doc: &Document) {
        match self.ledger.content_hash(&doc.name, self.embedding_model).await {
            Ok(Some(previous)) if previous != compute_content_hash(&doc.bytes) => warn!(
                "{} changed since it was processed; keeping the stored version",
                doc.name
            ),
            Ok(_) => {}
            Err(e) => debug!("Could not read ledger entry for {}: {}", doc.name, e),
        }
    }

    /// Retrieve passages for `question` and generate an answer from them
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        if self.processed.is_empty() {
            return Ok(AskOutcome::NoDocuments);
        }

        let sources = self
            .pipeline
            .collection
            .query(question, self.pipeline.top_n)
            .await?;
        if sources.is_empty() {
            info!("No relevant content found");
            return Ok(AskOutcome::NoResult);
        }

        let context: Vec<String> = sources.iter().map(|hit| hit.text.clone()).collect();
        debug!("Generating answer from {} passages", context.len());

        match self.pipeline.generator.generate(question, &context).await {
            Ok(answer) => Ok(AskOutcome::Answered { answer, sources }),
            Err(e) => {
                warn!("Generation failed: {}", e);
                Ok(AskOutcome::GenerationFailed {
                    reason: e.to_string(),
                    sources,
                })
            }
        }
    }

    /// Switch to another embedding model, building its embedder from `config`
    pub async fn switch_embedding_model(
        &mut self,
        key: EmbeddingModelKey,
        config: &Config,
    ) -> Result<()> {
        if key == self.embedding_model {
            return Ok(());
        }
        let embedder = create_embedder(key, config)?;
        self.switch_embedding_model_with(key, embedder).await
    }

    /// Switch to another embedding model using a prepared embedder. The new
    /// model gets its own collection and an empty processed set.
    pub async fn switch_embedding_model_with(
        &mut self,
        key: EmbeddingModelKey,
        embedder: Arc<dyn Embedder>,
    ) -> Result<()> {
        let collection = self
            .store
            .get_or_create_collection(&key.collection_name(), embedder)
            .await?;

        self.ledger.clear(key).await?;
        self.ledger.set_active_embedding_model(key).await?;

        info!("Embedding model switched from {} to {}", self.embedding_model, key);
        self.embedding_model = key;
        self.pipeline.collection = collection;
        self.processed.clear();
        Ok(())
    }

    /// Switch the generation backend. Stored documents are unaffected.
    pub fn switch_llm_model(&mut self, key: LlmModelKey, config: &Config) -> Result<()> {
        self.pipeline.generator = create_generator(key, config)?;
        self.llm_model = key;
        Ok(())
    }

    /// Forget which documents were processed under the active embedding
    /// model. Returns the number of ledger entries removed.
    pub async fn reset(&mut self) -> Result<u64> {
        let removed = self.ledger.clear(self.embedding_model).await?;
        self.processed.clear();
        info!("Cleared {} processed documents for {}", removed, self.embedding_model);
        Ok(removed)
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        Ok(SessionStatus {
            embedding_model: *self.embedding_model.descriptor(),
            llm_model: *self.llm_model.descriptor(),
            collection: self.pipeline.collection.name().to_string(),
            store_backend: self.store.backend_kind().to_string(),
            chunk_count: self.pipeline.collection.count().await?,
            processed_documents: self.ledger.list_processed(self.embedding_model).await?,
        })
    }
}
