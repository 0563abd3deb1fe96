//! Answer generation
//!
//! Builds a grounded prompt from retrieved passages and sends it to a
//! chat-completion backend.

mod openai;
#[cfg(test)]
pub(crate) mod testing;

pub use openai::*;

use crate::config::{Config, LOCAL_API_KEY};
use crate::error::Result;
use crate::models::LlmModelKey;
use async_trait::async_trait;
use std::sync::Arc;

/// System message sent with every request
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Trait for generation providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Answer `question` from `context` passages
    async fn generate(&self, question: &str, context: &[String]) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// The user message: grounding instructions, context, then the question
pub fn build_prompt(question: &str, context: &[String]) -> String {
    format!(
        "Based on the following context, answer the question. \
         If the context does not contain the answer, say \"I don't know\".\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context.join("\n\n"),
        question
    )
}

/// Create the generator selected by `key`
pub fn create_generator(key: LlmModelKey, config: &Config) -> Result<Arc<dyn Generator>> {
    let model = key.descriptor().model_name;
    let generator = match key {
        LlmModelKey::OpenAi => ChatCompletionGenerator::new(
            &config.http.openai_base_url,
            config.require_openai_api_key()?,
            model,
            config.http.timeout(),
        )?,
        LlmModelKey::Ollama => ChatCompletionGenerator::new(
            &config.http.ollama_base_url,
            LOCAL_API_KEY,
            model,
            config.http.timeout(),
        )?,
    };
    Ok(Arc::new(generator))
}
