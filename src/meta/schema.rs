//! SQLite schema definition

/// SQL schema for the session ledger
pub const SCHEMA_SQL: &str = r#"
-- Session state: small key/value settings such as the active embedding model
CREATE TABLE IF NOT EXISTS session_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Processed documents: one row per (document name, embedding model)
CREATE TABLE IF NOT EXISTS processed_documents (
    name TEXT NOT NULL,
    embedding_model TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    chunk_count INTEGER NOT NULL,
    processed_at TEXT NOT NULL,
    PRIMARY KEY (name, embedding_model)
);

CREATE INDEX IF NOT EXISTS idx_processed_model ON processed_documents(embedding_model);
"#;
