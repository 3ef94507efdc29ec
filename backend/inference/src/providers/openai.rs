use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use snaplens_core::{InferenceProvider, InferenceRequest, InferenceResponse, SnapError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat-completions inference provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse, SnapError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %self.model, variant = %request.variant, "Sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SnapError::InferenceFailed {
                provider: "openai".into(),
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SnapError::InferenceFailed {
                provider: "openai".into(),
                message: format!("returned {status}: {error_body}"),
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| SnapError::InferenceFailed {
                provider: "openai".into(),
                message: format!("malformed reply: {e}"),
            })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(InferenceResponse {
            content,
            provider: "openai".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parsing_with_and_without_content() {
        let with: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"42"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            with.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .as_deref(),
            Some("42")
        );

        // Absent content field parses to None, which the client maps to its
        // soft fallback rather than a failure.
        let without: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(without
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .is_none());

        let empty: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}
