//! Ingest command implementation

use crate::error::Error;
use crate::parse::Document;
use crate::progress::document_progress;
use crate::session::{DocumentState, ProcessingOutcome, Session};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub docs_stored: usize,
    pub docs_skipped: usize,
    pub docs_failed: usize,
    pub chunks_created: usize,
    pub outcomes: Vec<ProcessingOutcome>,
}

impl IngestStats {
    fn record(&mut self, outcome: ProcessingOutcome) {
        match &outcome {
            ProcessingOutcome::Stored { chunks, .. } => {
                self.docs_stored += 1;
                self.chunks_created += chunks;
            }
            ProcessingOutcome::Skipped { .. } => self.docs_skipped += 1,
            ProcessingOutcome::Failed { .. } => self.docs_failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Ingest files in argument order. A file that cannot be read or processed
/// is recorded as failed and the rest of the batch continues.
pub async fn cmd_ingest(session: &mut Session, paths: &[PathBuf]) -> IngestStats {
    info!(
        "Ingesting {} files with {} embeddings",
        paths.len(),
        session.embedding_model()
    );

    let pb = document_progress(paths.len());
    let mut stats = IngestStats::default();

    for path in paths {
        let label = path.display().to_string();
        if let Some(pb) = &pb {
            pb.set_message(label.clone());
        }

        let outcome = match Document::from_path(path) {
            Ok(doc) => session.ingest(doc).await,
            Err(e) => read_failure(label, e),
        };
        stats.record(outcome);

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    stats
}

fn read_failure(name: String, error: Error) -> ProcessingOutcome {
    ProcessingOutcome::Failed {
        name,
        stage: DocumentState::Uploaded,
        kind: error.kind(),
        reason: error.to_string(),
    }
}

/// Print ingestion results
pub fn print_ingest_stats(stats: &IngestStats) {
    println!();
    for outcome in &stats.outcomes {
        match outcome {
            ProcessingOutcome::Stored { name, chunks } => {
                println!("✓ {} ({} chunks)", name, chunks)
            }
            ProcessingOutcome::Skipped { name } => println!("- {} (already processed)", name),
            ProcessingOutcome::Failed { name, reason, .. } => println!("✗ {}: {}", name, reason),
        }
    }

    println!("\n✓ Ingestion complete");
    println!("  Documents stored: {}", stats.docs_stored);
    println!("  Documents skipped: {}", stats.docs_skipped);
    println!("  Documents failed: {}", stats.docs_failed);
    println!("  Chunks created: {}", stats.chunks_created);
}
