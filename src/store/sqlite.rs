//! Embedded vector store on SQLite
//!
//! Vectors are stored as little-endian `f32` BLOBs and searched with an
//! exhaustive cosine scan over the collection.

use super::{cosine_similarity, SearchHit, StoredChunk, VectorBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};

const VECTOR_SCHEMA_SQL: &str = r#"
-- Collections: one per embedding model, bound at creation
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimension INTEGER NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Chunks: text, source and vector
CREATE TABLE IF NOT EXISTS chunks (
    collection TEXT NOT NULL REFERENCES collections(name),
    id TEXT NOT NULL,
    text TEXT NOT NULL,
    source TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(collection, source);
"#;

#[derive(Debug, FromRow)]
struct CollectionRow {
    dimension: i64,
    embedding_model: String,
}

#[derive(Debug, FromRow)]
struct ChunkRow {
    id: String,
    text: String,
    source: String,
    embedding: Vec<u8>,
}

/// SQLite-backed vector store
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to vector database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(VECTOR_SCHEMA_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    async fn collection_row(&self, name: &str) -> Result<Option<CollectionRow>> {
        let row = sqlx::query_as::<_, CollectionRow>(
            "SELECT dimension, embedding_model FROM collections WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn collection_dimension(&self, name: &str) -> Result<usize> {
        self.collection_row(name)
            .await?
            .map(|row| row.dimension as usize)
            .ok_or_else(|| Error::Store(format!("Collection '{}' does not exist", name)))
    }
}

#[async_trait]
impl VectorBackend for SqliteVectorStore {
    async fn ensure_collection(&self, name: &str, dimension: usize, model: &str) -> Result<()> {
        if let Some(existing) = self.collection_row(name).await? {
            if existing.dimension as usize != dimension || existing.embedding_model != model {
                return Err(Error::Store(format!(
                    "Collection '{}' was created with model '{}' ({} dims), not '{}' ({} dims)",
                    name, existing.embedding_model, existing.dimension, model, dimension
                )));
            }
            debug!("Collection {} already exists", name);
            return Ok(());
        }

        info!("Creating collection {} with dimension {}", name, dimension);
        sqlx::query(
            "INSERT INTO collections (name, dimension, embedding_model, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(dimension as i64)
        .bind(model)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, records: Vec<StoredChunk>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let dimension = self.collection_dimension(collection).await?;
        if let Some(mismatch) = records.iter().find(|r| r.vector.len() != dimension) {
            return Err(Error::Store(format!(
                "Vector dimension mismatch for collection '{}': expected {}, got {}",
                collection,
                dimension,
                mismatch.vector.len()
            )));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for record in &records {
            let result = sqlx::query(
                r#"
                INSERT INTO chunks (collection, id, text, source, embedding, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(collection)
            .bind(&record.id)
            .bind(&record.text)
            .bind(&record.source)
            .bind(embedding_to_bytes(&record.vector))
            .bind(&now)
            .execute(&mut *tx)
            .await;

            // Returning drops `tx`, which rolls the batch back
            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(e)) if is_duplicate_key(e.as_ref()) => {
                    return Err(Error::Store(format!(
                        "Duplicate chunk id {} in collection '{}'",
                        record.id, collection
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let dimension = self.collection_dimension(collection).await?;
        if vector.len() != dimension {
            return Err(Error::Store(format!(
                "Query vector has {} dims but collection '{}' has {}",
                vector.len(),
                collection,
                dimension
            )));
        }

        let rows = sqlx::query_as::<_, ChunkRow>(
            "SELECT id, text, source, embedding FROM chunks WHERE collection = ?",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        debug!("Scanning {} vectors in {}", rows.len(), collection);

        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .map(|row| {
                let score = cosine_similarity(vector, &bytes_to_embedding(&row.embedding));
                SearchHit {
                    id: row.id,
                    text: row.text,
                    source: row.source,
                    score,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}

fn is_duplicate_key(err: &dyn sqlx::error::DatabaseError) -> bool {
    // 1555 is SQLITE_CONSTRAINT_PRIMARYKEY
    err.is_unique_violation() || err.code().as_deref() == Some("1555")
}

/// Serialize embedding to bytes for SQLite BLOB storage
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from SQLite BLOB bytes
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, text: &str, vector: Vec<f32>) -> StoredChunk {
        StoredChunk {
            id: id.to_string(),
            text: text.to_string(),
            source: "doc.txt".to_string(),
            vector,
        }
    }

    #[test]
    fn test_embedding_bytes() {
        let emb = vec![0.1, 0.2, -0.3, 0.4];
        let bytes = embedding_to_bytes(&emb);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_embedding(&bytes), emb);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(&tmp.path().join("v.db")).await.unwrap();
        store.ensure_collection("c", 2, "m").await.unwrap();

        store
            .insert(
                "c",
                vec![
                    record("far", "far", vec![0.0, 1.0]),
                    record("near", "near", vec![1.0, 0.1]),
                    record("mid", "mid", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store.search("c", &[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[tokio::test]
    async fn test_duplicate_in_batch_rolls_back() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(&tmp.path().join("v.db")).await.unwrap();
        store.ensure_collection("c", 2, "m").await.unwrap();

        let err = store
            .insert(
                "c",
                vec![
                    record("a", "first", vec![1.0, 0.0]),
                    record("b", "second", vec![0.0, 1.0]),
                    record("a", "again", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_id_allowed_in_different_collections() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(&tmp.path().join("v.db")).await.unwrap();
        store.ensure_collection("a", 2, "m").await.unwrap();
        store.ensure_collection("b", 3, "n").await.unwrap();

        store
            .insert("a", vec![record("x", "t", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .insert("b", vec![record("x", "t", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.count("a").await.unwrap(), 1);
        assert_eq!(store.count("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_checks() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(&tmp.path().join("v.db")).await.unwrap();
        store.ensure_collection("c", 3, "m").await.unwrap();

        assert!(matches!(
            store.insert("c", vec![record("a", "t", vec![1.0])]).await,
            Err(Error::Store(_))
        ));
        assert!(matches!(
            store.search("c", &[1.0, 0.0], 3).await,
            Err(Error::Store(_))
        ));
        assert!(matches!(
            store.ensure_collection("c", 4, "m").await,
            Err(Error::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_store_error() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(&tmp.path().join("v.db")).await.unwrap();
        assert!(matches!(
            store.search("missing", &[1.0], 3).await,
            Err(Error::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("v.db");

        {
            let store = SqliteVectorStore::open(&path).await.unwrap();
            store.ensure_collection("c", 2, "m").await.unwrap();
            store
                .insert("c", vec![record("a", "kept", vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let store = SqliteVectorStore::open(&path).await.unwrap();
        store.ensure_collection("c", 2, "m").await.unwrap();
        let hits = store.search("c", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "kept");
    }
}
