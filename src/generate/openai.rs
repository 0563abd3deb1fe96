//! OpenAI-compatible chat completions

use super::{build_prompt, Generator, SYSTEM_PROMPT};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Generator for any endpoint implementing `/chat/completions`
pub struct ChatCompletionGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionGenerator {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Setup(format!("Failed to build chat client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Generator for ChatCompletionGenerator {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(question, context),
                },
            ],
            stream: false,
        };

        debug!(
            "Requesting completion from {} with {} passages",
            self.model,
            context.len()
        );

        let mut req = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "Chat API error ({}): {}",
                status.as_u16(),
                text
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Invalid chat response: {}", e)))?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| Error::Generation("Chat API returned no choices".to_string()))
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

    fn generator(server: &MockServer, key: &str) -> ChatCompletionGenerator {
        ChatCompletionGenerator::new(
            &format!("{}/v1", server.uri()),
            key,
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "Paris."}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "Lyon."}, "finish_reason": "stop"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = generator(&server, "sk-test")
            .generate(
                "What is the capital of France?",
                &["Paris is the capital of France.".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(answer, "Paris.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Paris is the capital of France."));
        assert!(user.contains("What is the capital of France?"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = generator(&server, "k")
            .generate("q", &["c".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        match generator(&server, "k").generate("q", &[]).await {
            Err(Error::Generation(message)) => {
                assert!(message.contains("500"));
                assert!(message.contains("model overloaded"));
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_generation_error() {
        let generator = ChatCompletionGenerator::new(
            "http://127.0.0.1:1/v1",
            "",
            "llama3.2",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(
            generator.generate("q", &[]).await,
            Err(Error::Generation(_))
        ));
    }
}
