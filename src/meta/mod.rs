//! Session ledger using SQLite
//!
//! This module persists the orchestrator's idempotency guard:
//! - The active embedding model
//! - Documents already processed under each embedding model

mod schema;

pub use schema::*;

use crate::error::Result;
use crate::models::EmbeddingModelKey;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info, warn};

const ACTIVE_EMBEDDING_MODEL_KEY: &str = "active_embedding_model";

/// A document recorded as processed
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub name: String,
    pub embedding_model: String,
    pub content_hash: String,
    pub chunk_count: i64,
    pub processed_at: String,
}

/// Ledger database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Open (creating if needed) the ledger at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        // Auto-initialize schema if needed
        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing session ledger schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='processed_documents'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(result.is_some())
    }

    // ===== Session State =====

    /// The embedding model recorded by the last session, if any. An
    /// unrecognized stored value reads as `None`.
    pub async fn active_embedding_model(&self) -> Result<Option<EmbeddingModelKey>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM session_state WHERE key = ?")
                .bind(ACTIVE_EMBEDDING_MODEL_KEY)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value.and_then(|v| match v.parse() {
            Ok(key) => Some(key),
            Err(_) => {
                warn!("Ignoring unknown stored embedding model '{}'", v);
                None
            }
        }))
    }

    pub async fn set_active_embedding_model(&self, key: EmbeddingModelKey) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(ACTIVE_EMBEDDING_MODEL_KEY)
        .bind(key.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ===== Processed Documents =====

    /// Names of documents processed under `model`
    pub async fn processed_names(&self, model: EmbeddingModelKey) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM processed_documents WHERE embedding_model = ? ORDER BY processed_at, name",
        )
        .bind(model.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Full records for documents processed under `model`
    pub async fn list_processed(&self, model: EmbeddingModelKey) -> Result<Vec<ProcessedDocument>> {
        let docs = sqlx::query_as::<_, ProcessedDocument>(
            "SELECT * FROM processed_documents WHERE embedding_model = ? ORDER BY processed_at, name",
        )
        .bind(model.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Stored content hash of `name` under `model`
    pub async fn content_hash(&self, name: &str, model: EmbeddingModelKey) -> Result<Option<String>> {
        let hash: Option<String> = sqlx::query_scalar(
            "SELECT content_hash FROM processed_documents WHERE name = ? AND embedding_model = ?",
        )
        .bind(name)
        .bind(model.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    /// Record `name` as stored under `model`
    pub async fn mark_processed(
        &self,
        name: &str,
        model: EmbeddingModelKey,
        content_hash: &str,
        chunk_count: usize,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_documents (name, embedding_model, content_hash, chunk_count, processed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name, embedding_model) DO UPDATE SET
                content_hash = excluded.content_hash,
                chunk_count = excluded.chunk_count,
                processed_at = excluded.processed_at
            "#,
        )
        .bind(name)
        .bind(model.as_str())
        .bind(content_hash)
        .bind(chunk_count as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Forget every document processed under `model`. Returns the number removed.
    pub async fn clear(&self, model: EmbeddingModelKey) -> Result<u64> {
        let result = sqlx::query("DELETE FROM processed_documents WHERE embedding_model = ?")
            .bind(model.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
