//! Ask command implementation

use crate::error::Result;
use crate::session::{AskOutcome, Session};
use crate::store::SearchHit;
use serde::Serialize;
use tracing::info;

/// Answer for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct AskResult {
    pub question: String,
    pub embedding_model: String,
    pub llm_model: String,
    #[serde(flatten)]
    pub outcome: AskOutcome,
}

/// Answer `question` from the documents ingested under the active model
pub async fn cmd_ask(session: &Session, question: &str) -> Result<AskResult> {
    info!("Asking: {}", question);

    let outcome = session.ask(question).await?;
    Ok(AskResult {
        question: question.to_string(),
        embedding_model: session.embedding_model().to_string(),
        llm_model: session.llm_model().to_string(),
        outcome,
    })
}

/// Print answer and source passages
pub fn print_ask_result(result: &AskResult) {
    println!("\n❓ {}\n", result.question);

    match &result.outcome {
        AskOutcome::Answered { answer, sources } => {
            println!("{}\n", answer.trim());
            print_sources(sources);
        }
        AskOutcome::GenerationFailed { reason, sources } => {
            println!("✗ No answer: {}\n", reason);
            print_sources(sources);
        }
        AskOutcome::NoResult => println!("No relevant content found."),
        AskOutcome::NoDocuments => println!(
            "No documents have been processed with the {} embedding model. Run 'docqa ingest' first.",
            result.embedding_model
        ),
    }
}

fn print_sources(sources: &[SearchHit]) {
    println!("Sources:");
    for (i, hit) in sources.iter().enumerate() {
        println!("{}. [score: {:.3}] {}", i + 1, hit.score, hit.source);
        let preview: String = hit.text.chars().take(200).collect();
        let ellipsis = if hit.text.chars().count() > 200 { "..." } else { "" };
        println!("   {}{}\n", preview.trim().replace('\n', " "), ellipsis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmbeddingModelKey;
    use crate::parse::Document;
    use crate::session::testing::open;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ask_result_serializes_outcome_inline() {
        let tmp = TempDir::new().unwrap();
        let mut h = open(tmp.path(), EmbeddingModelKey::Chroma).await;
        h.session
            .ingest(Document::text("doc1.txt", "Paris is the capital of France."))
            .await;

        let result = cmd_ask(&h.session, "What is the capital of France?")
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "answered");
        assert_eq!(json["embedding_model"], "chroma");
        assert_eq!(json["llm_model"], "ollama");
        assert!(json["answer"].as_str().unwrap().contains("Paris"));
        assert_eq!(json["sources"][0]["source"], "doc1.txt");
    }

    #[tokio::test]
    async fn test_ask_without_documents() {
        let tmp = TempDir::new().unwrap();
        let h = open(tmp.path(), EmbeddingModelKey::Chroma).await;

        let result = cmd_ask(&h.session, "Anything?").await.unwrap();
        assert!(matches!(result.outcome, AskOutcome::NoDocuments));
        assert_eq!(serde_json::to_value(&result).unwrap()["status"], "no_documents");
    }
}
