//! OpenAI-compatible embedding backend
//!
//! Serves both the hosted OpenAI API and local servers that speak the same
//! `/embeddings` protocol (Ollama serving `nomic-embed-text`).

use super::{validate_dimensions, Embedder};
use crate::config::{Config, LOCAL_API_KEY};
use crate::error::{Error, Result};
use crate::models::EmbeddingModelKey;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Embedder for any endpoint implementing the OpenAI embeddings API
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Setup(format!("Failed to build embedding client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        })
    }

    /// Build the hosted (`openai`) or local (`nomic`) embedder
    pub fn from_config(key: EmbeddingModelKey, config: &Config) -> Result<Self> {
        let descriptor = key.descriptor();
        let model = descriptor.model_name.ok_or_else(|| {
            Error::Setup(format!("Embedding model '{}' is not served over HTTP", key))
        })?;

        let (base_url, api_key) = match key {
            EmbeddingModelKey::OpenAi => (
                config.http.openai_base_url.as_str(),
                config.require_openai_api_key()?,
            ),
            _ => (config.http.ollama_base_url.as_str(), LOCAL_API_KEY),
        };

        Self::new(
            base_url,
            api_key,
            model,
            descriptor.dimensions,
            config.http.timeout(),
        )
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::Embedding(format!(
                "Embedding API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Invalid embedding response: {}", e)))?;

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let embeddings = self.request(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Embedding API returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        validate_dimensions(self, &embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer, dimension: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            &format!("{}/v1", server.uri()),
            "test-key",
            "text-embedding-3-small",
            dimension,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_request_shape_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "text-embedding-3-small",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0, 0.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0, 0.0]}
                ],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vectors = embedder(&server, 3)
            .embed(vec!["first".into(), "second".into()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, 3)
            .embed(vec!["text".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, 3)
            .embed(vec!["text".into()])
            .await
            .unwrap_err();
        match err {
            Error::Embedding(message) => {
                assert!(message.contains("401"));
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("expected embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_vectors_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server, 3)
            .embed(vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let vectors = embedder(&server, 3).embed(Vec::new()).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn test_from_config_uses_local_endpoint_for_nomic() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::for_data_dir(tmp.path());
        config.http.ollama_base_url = "http://localhost:11434/v1/".to_string();

        let embedder = OpenAiEmbedder::from_config(EmbeddingModelKey::Nomic, &config).unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:11434/v1/embeddings");
        assert_eq!(embedder.api_key, LOCAL_API_KEY);
        assert_eq!(embedder.dimension(), 768);
    }

    #[test]
    fn test_from_config_rejects_builtin_model() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::for_data_dir(tmp.path());
        assert!(matches!(
            OpenAiEmbedder::from_config(EmbeddingModelKey::Chroma, &config),
            Err(Error::Setup(_))
        ));
    }
}
