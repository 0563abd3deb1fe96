//! Model registry for embedding and generation backends.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const NOMIC_EMBEDDING_MODEL: &str = "nomic-embed-text";
const OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
const OLLAMA_CHAT_MODEL: &str = "llama3.2";

/// Embedding backends. Each key owns its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingModelKey {
    /// Hosted OpenAI embeddings
    #[serde(rename = "openai")]
    OpenAi,
    /// Built-in local model
    #[serde(alias = "default")]
    Chroma,
    /// nomic-embed-text served by a local OpenAI-compatible endpoint
    Nomic,
}

/// Chat-completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmModelKey {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

/// Static description of an embedding model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbeddingModelDescriptor {
    pub key: EmbeddingModelKey,
    pub name: &'static str,
    pub dimensions: usize,
    /// `None` for the built-in model, which has no remote identifier
    pub model_name: Option<&'static str>,
}

/// Static description of a generation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LlmModelDescriptor {
    pub key: LlmModelKey,
    pub name: &'static str,
    pub model_name: &'static str,
}

pub const EMBEDDING_MODELS: [EmbeddingModelDescriptor; 3] = [
    EmbeddingModelDescriptor {
        key: EmbeddingModelKey::OpenAi,
        name: "OpenAI Embeddings",
        dimensions: 1536,
        model_name: Some(OPENAI_EMBEDDING_MODEL),
    },
    EmbeddingModelDescriptor {
        key: EmbeddingModelKey::Chroma,
        name: "Default Embeddings",
        dimensions: 384,
        model_name: None,
    },
    EmbeddingModelDescriptor {
        key: EmbeddingModelKey::Nomic,
        name: "Nomic Embed Text",
        dimensions: 768,
        model_name: Some(NOMIC_EMBEDDING_MODEL),
    },
];

pub const LLM_MODELS: [LlmModelDescriptor; 2] = [
    LlmModelDescriptor {
        key: LlmModelKey::OpenAi,
        name: "GPT-4o mini",
        model_name: OPENAI_CHAT_MODEL,
    },
    LlmModelDescriptor {
        key: LlmModelKey::Ollama,
        name: "Llama 3.2",
        model_name: OLLAMA_CHAT_MODEL,
    },
];

impl EmbeddingModelKey {
    pub const ALL: [EmbeddingModelKey; 3] = [
        EmbeddingModelKey::OpenAi,
        EmbeddingModelKey::Chroma,
        EmbeddingModelKey::Nomic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingModelKey::OpenAi => "openai",
            EmbeddingModelKey::Chroma => "chroma",
            EmbeddingModelKey::Nomic => "nomic",
        }
    }

    pub fn descriptor(&self) -> &'static EmbeddingModelDescriptor {
        match self {
            EmbeddingModelKey::OpenAi => &EMBEDDING_MODELS[0],
            EmbeddingModelKey::Chroma => &EMBEDDING_MODELS[1],
            EmbeddingModelKey::Nomic => &EMBEDDING_MODELS[2],
        }
    }

    pub fn dimensions(&self) -> usize {
        self.descriptor().dimensions
    }

    /// Name of the collection holding vectors produced by this model
    pub fn collection_name(&self) -> String {
        format!("documents_{}", self.as_str())
    }

    /// Whether this backend needs `OPENAI_API_KEY`
    pub fn requires_api_key(&self) -> bool {
        matches!(self, EmbeddingModelKey::OpenAi)
    }
}

impl LlmModelKey {
    pub const ALL: [LlmModelKey; 2] = [LlmModelKey::OpenAi, LlmModelKey::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmModelKey::OpenAi => "openai",
            LlmModelKey::Ollama => "ollama",
        }
    }

    pub fn descriptor(&self) -> &'static LlmModelDescriptor {
        match self {
            LlmModelKey::OpenAi => &LLM_MODELS[0],
            LlmModelKey::Ollama => &LLM_MODELS[1],
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, LlmModelKey::OpenAi)
    }
}

impl fmt::Display for EmbeddingModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LlmModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingModelKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingModelKey::OpenAi),
            "chroma" | "default" => Ok(EmbeddingModelKey::Chroma),
            "nomic" => Ok(EmbeddingModelKey::Nomic),
            _ => Err(Error::Config(format!(
                "Unknown embedding model '{}'; expected one of openai, chroma, nomic",
                s
            ))),
        }
    }
}

impl FromStr for LlmModelKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmModelKey::OpenAi),
            "ollama" => Ok(LlmModelKey::Ollama),
            _ => Err(Error::Config(format!(
                "Unknown LLM model '{}'; expected one of openai, ollama",
                s
            ))),
        }
    }
}
