//! Status and reset command implementation

use crate::config::Config;
use crate::error::Result;
use crate::session::{Session, SessionStatus};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub vectors_db: String,
    pub session_db: String,
    #[serde(flatten)]
    pub session: SessionStatus,
}

/// Get session status
pub async fn cmd_status(config: &Config, session: &Session) -> Result<StatusInfo> {
    info!("Getting status");

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        vectors_db: config.paths.vectors_db.display().to_string(),
        session_db: config.paths.session_db.display().to_string(),
        session: session.status().await?,
    })
}

/// Result of clearing the processed-document ledger
#[derive(Debug, Clone, Serialize)]
pub struct ResetStats {
    pub embedding_model: String,
    pub documents_cleared: u64,
}

pub async fn cmd_reset(session: &mut Session) -> Result<ResetStats> {
    let documents_cleared = session.reset().await?;
    Ok(ResetStats {
        embedding_model: session.embedding_model().to_string(),
        documents_cleared,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    let session = &status.session;

    println!("\n📊 docqa Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Vector store: {} ({})", session.store_backend, status.vectors_db);
    println!("Session ledger: {}", status.session_db);

    println!(
        "\nEmbedding Model: {} ({}, {} dims)",
        session.embedding_model.key, session.embedding_model.name, session.embedding_model.dimensions
    );
    println!(
        "LLM Model: {} ({})",
        session.llm_model.key, session.llm_model.model_name
    );

    println!("\nCollection: {}", session.collection);
    println!("  Chunks: {}", session.chunk_count);
    println!("  Documents: {}", session.processed_documents.len());
    for doc in &session.processed_documents {
        println!(
            "    {} ({} chunks, {})",
            doc.name, doc.chunk_count, doc.processed_at
        );
    }
}

pub fn print_reset_stats(stats: &ResetStats) {
    println!(
        "✓ Cleared {} processed documents for the {} embedding model",
        stats.documents_cleared, stats.embedding_model
    );
}
