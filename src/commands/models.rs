//! Models command implementation

use crate::config::Config;
use crate::models::{
    EmbeddingModelDescriptor, EmbeddingModelKey, LlmModelDescriptor, LlmModelKey,
    EMBEDDING_MODELS, LLM_MODELS,
};
use serde::Serialize;

/// Available backends and the ones currently selected
#[derive(Debug, Clone, Serialize)]
pub struct ModelsInfo {
    pub active_embedding_model: EmbeddingModelKey,
    pub active_llm_model: LlmModelKey,
    pub embedding_models: Vec<EmbeddingModelDescriptor>,
    pub llm_models: Vec<LlmModelDescriptor>,
}

pub fn cmd_models(config: &Config) -> ModelsInfo {
    ModelsInfo {
        active_embedding_model: config.embedding_model,
        active_llm_model: config.llm_model,
        embedding_models: EMBEDDING_MODELS.to_vec(),
        llm_models: LLM_MODELS.to_vec(),
    }
}

pub fn print_models(info: &ModelsInfo) {
    println!("\nEmbedding models:");
    for model in &info.embedding_models {
        let marker = if model.key == info.active_embedding_model { "*" } else { " " };
        println!(
            " {} {:<8} {} ({} dims, {})",
            marker,
            model.key.as_str(),
            model.name,
            model.dimensions,
            model.model_name.unwrap_or("built-in")
        );
    }

    println!("\nLLM models:");
    for model in &info.llm_models {
        let marker = if model.key == info.active_llm_model { "*" } else { " " };
        println!(
            " {} {:<8} {} ({})",
            marker,
            model.key.as_str(),
            model.name,
            model.model_name
        );
    }
}
