//! Shared HTTP plumbing for OpenAI-compatible endpoints.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;

use super::errors::{UpstreamError, UpstreamResult};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Connection settings, passed explicitly at construction
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_base: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Override the base URL (tests point this at a mock server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Authenticated client bound to one API base
#[derive(Debug, Clone)]
pub(crate) struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    pub(crate) fn new(settings: &OpenAiSettings) -> UpstreamResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(UpstreamError::MissingCredential(
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| UpstreamError::unavailable(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(&self.api_key)
    }
}

/// OpenAI error bodies come as `{"error": {"message": ...}}`; some proxies
/// send `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Turn a non-success response into an `UpstreamError`
pub(crate) async fn error_from_response(response: Response) -> UpstreamError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { message },
        })
        | Ok(ErrorEnvelope {
            error: ErrorBody::Plain(message),
        }) => message,
        Err(_) if body.is_empty() => "no response body".to_string(),
        Err(_) => body,
    };

    UpstreamError::from_status(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let err = OpenAiClient::new(&OpenAiSettings::new("  ")).unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredential(_)));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let settings = OpenAiSettings::new("k").with_api_base("http://localhost:9999/");
        let client = OpenAiClient::new(&settings).unwrap();
        assert_eq!(
            client.url("/v1/chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
