//! Chat-completion transformer.
//!
//! Sends the current AsciiDoc source as the system message and the user's
//! instruction as the user message, and returns the first choice's content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{error_from_response, OpenAiClient, OpenAiSettings};
use super::errors::{UpstreamError, UpstreamResult};
use super::traits::TextTransformer;
use crate::observability::{log_event_with_fields, Event};

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Default completion budget per request
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

const SYSTEM_PREAMBLE: &str = "Change this ascii-doc based on the user input:\n";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// `TextTransformer` backed by an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct ChatTransformer {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl ChatTransformer {
    /// Fails with `MissingCredential` when the settings carry no API key
    pub fn new(settings: &OpenAiSettings, model: impl Into<String>) -> UpstreamResult<Self> {
        Ok(Self {
            client: OpenAiClient::new(settings)?,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, content: &[u8], instruction: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: format!("{}{}", SYSTEM_PREAMBLE, String::from_utf8_lossy(content)),
                },
                ChatMessage {
                    role: "user",
                    content: instruction.to_string(),
                },
            ],
            temperature: 1.0,
            max_tokens: self.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[async_trait]
impl TextTransformer for ChatTransformer {
    async fn transform(&self, content: &[u8], instruction: &str) -> UpstreamResult<Vec<u8>> {
        let request = self.build_request(content, instruction);

        let content_bytes = content.len().to_string();
        log_event_with_fields(
            Event::TransformRequest,
            &[("model", &self.model), ("content_bytes", &content_bytes)],
        );

        let response = self
            .client
            .post(CHAT_COMPLETIONS_PATH)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ChatResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            log_event_with_fields(
                Event::TransformResponse,
                &[
                    ("prompt_tokens", &usage.prompt_tokens.to_string()),
                    ("completion_tokens", &usage.completion_tokens.to_string()),
                    ("total_tokens", &usage.total_tokens.to_string()),
                ],
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(String::into_bytes)
            .ok_or_else(|| UpstreamError::InvalidResponse("empty response from chat model".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transformer(server: &MockServer) -> ChatTransformer {
        let settings = OpenAiSettings::new("test-key").with_api_base(server.uri());
        ChatTransformer::new(&settings, DEFAULT_CHAT_MODEL).unwrap()
    }

    #[test]
    fn test_missing_credential() {
        let err = ChatTransformer::new(&OpenAiSettings::new(""), DEFAULT_CHAT_MODEL).unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredential(_)));
    }

    #[test]
    fn test_request_shape() {
        let settings = OpenAiSettings::new("k");
        let t = ChatTransformer::new(&settings, "gpt-test").unwrap();
        let req = serde_json::to_value(t.build_request(b"= Title", "make it formal")).unwrap();

        assert_eq!(req["model"], "gpt-test");
        assert_eq!(req["messages"][0]["role"], "system");
        assert_eq!(
            req["messages"][0]["content"],
            "Change this ascii-doc based on the user input:\n= Title"
        );
        assert_eq!(req["messages"][1]["role"], "user");
        assert_eq!(req["messages"][1]["content"], "make it formal");
        assert_eq!(req["max_tokens"], 2048);

        let t = t.with_max_tokens(256);
        let req = serde_json::to_value(t.build_request(b"= Title", "shorter")).unwrap();
        assert_eq!(req["max_tokens"], 256);
    }

    #[tokio::test]
    async fn test_transform_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "Good day"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .mount(&server)
            .await;

        let out = transformer(&server)
            .transform(b"Hello", "make it formal")
            .await
            .unwrap();
        assert_eq!(out, b"Good day");
    }

    #[tokio::test]
    async fn test_no_choices_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = transformer(&server).transform(b"x", "y").await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        match transformer(&server).transform(b"x", "y").await.unwrap_err() {
            UpstreamError::Unauthorized { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached"}
            })))
            .mount(&server)
            .await;

        let err = transformer(&server).transform(b"x", "y").await.unwrap_err();
        assert!(matches!(err, UpstreamError::RateLimited { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        match transformer(&server).transform(b"x", "y").await.unwrap_err() {
            UpstreamError::Unavailable { status, message } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let settings = OpenAiSettings::new("test-key")
            .with_api_base(server.uri())
            .with_timeout(Duration::from_millis(100));
        let t = ChatTransformer::new(&settings, DEFAULT_CHAT_MODEL).unwrap();

        let err = t.transform(b"x", "y").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable { status: None, .. }));
    }
}
