// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Chat Completions API.
//!
//! Handles request construction, authentication, and transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use fincabot_core::{ChatMessage, FincabotError, Sender, TextGenerator};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, WireMessage};

/// Token cap for the constrained classification call.
const CLASSIFY_MAX_TOKENS: u32 = 300;

/// HTTP client for Chat Completions.
///
/// Manages authentication headers, connection pooling, and retry logic for
/// transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// `base_url` is the full Chat Completions endpoint URL; `model` and
    /// `max_tokens` apply to free-form generation.
    pub fn new(
        api_key: &str,
        base_url: String,
        model: String,
        max_tokens: u32,
    ) -> Result<Self, FincabotError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| FincabotError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| FincabotError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            model,
            max_tokens,
            max_retries: 1,
        })
    }

    /// Sends a completion request, retrying once on transient status codes.
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, FincabotError> {
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| FincabotError::Generation {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body: ChatCompletionResponse =
                    response.json().await.map_err(|e| FincabotError::Generation {
                        message: format!("malformed completion response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return body
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| FincabotError::Generation {
                        message: "completion response contained no choices".to_string(),
                        source: None,
                    });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(FincabotError::Generation {
                message,
                source: None,
            });
        }

        Err(FincabotError::Generation {
            message: "retries exhausted".to_string(),
            source: None,
        })
    }
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

fn to_wire(messages: &[ChatMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| WireMessage {
            role: match m.role {
                Sender::User => "user".to_string(),
                Sender::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        })
        .collect()
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, FincabotError> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        wire.extend(to_wire(messages));

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: wire,
            max_tokens: Some(self.max_tokens),
            temperature: None,
        };
        self.complete(&request).await
    }

    async fn classify(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, FincabotError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
            max_tokens: Some(CLASSIFY_MAX_TOKENS),
            temperature: Some(0.0),
        };
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    async fn make_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            "gpt-4o-mini".to_string(),
            256,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn generate_sends_system_prompt_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("¡Claro! 🏡")))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let history = vec![ChatMessage {
            role: Sender::User,
            content: "hola".into(),
        }];
        let reply = client.generate("Eres Hernán.", &history).await.unwrap();
        assert_eq!(reply, "¡Claro! 🏡");
    }

    #[tokio::test]
    async fn transient_error_retries_once_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let reply = client.classify("clasifica", "otras opciones").await.unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn non_transient_error_surfaces_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "bad key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let err = client.generate("sys", &[]).await.unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        assert!(client.generate("sys", &[]).await.is_err());
    }
}
