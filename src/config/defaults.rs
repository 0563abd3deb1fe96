//! Default values for configuration

use crate::models::{EmbeddingModelKey, LlmModelKey};

/// Default embedding backend
pub fn default_embedding_model() -> EmbeddingModelKey {
    EmbeddingModelKey::OpenAi
}

/// Default generation backend
pub fn default_llm_model() -> LlmModelKey {
    LlmModelKey::OpenAi
}

/// Default characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default number of passages retrieved per question
pub fn default_query_top_n() -> usize {
    3
}

/// Default batch size for embedding requests
pub fn default_embedding_batch_size() -> usize {
    64
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    "http://127.0.0.1:6334".to_string()
}

/// Default hosted OpenAI API base
pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default local OpenAI-compatible API base (Ollama)
pub fn default_ollama_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

/// Default request timeout in seconds for every outbound HTTP call
pub fn default_http_timeout() -> u64 {
    60
}
