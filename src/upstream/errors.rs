//! # Upstream Errors
//!
//! Failures of the external transformer and transcriber. Each variant keeps
//! the collaborator's HTTP status (when there was one) and message.

use thiserror::Error;

/// Result type for upstream calls
pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// No credential configured; raised at construction, never at call time
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Rate limited (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    /// The request was understood and refused (other 4xx)
    #[error("Rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Transport failure, timeout or 5xx
    #[error("Unavailable: {message}")]
    Unavailable { status: Option<u16>, message: String },

    /// Unparseable body, no choices, or empty output
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Map a non-success HTTP status and message to a variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => UpstreamError::Unauthorized { status, message },
            429 => UpstreamError::RateLimited { status, message },
            400..=499 => UpstreamError::Rejected { status, message },
            _ => UpstreamError::Unavailable {
                status: Some(status),
                message,
            },
        }
    }

    /// Unavailable without an HTTP status
    pub fn unavailable(message: impl Into<String>) -> Self {
        UpstreamError::Unavailable {
            status: None,
            message: message.into(),
        }
    }

    /// Upstream HTTP status, if the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Unauthorized { status, .. }
            | UpstreamError::RateLimited { status, .. }
            | UpstreamError::Rejected { status, .. } => Some(*status),
            UpstreamError::Unavailable { status, .. } => *status,
            UpstreamError::MissingCredential(_) | UpstreamError::InvalidResponse(_) => None,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            UpstreamError::MissingCredential(_) => "ADOC_UPSTREAM_MISSING_CREDENTIAL",
            UpstreamError::Unauthorized { .. } => "ADOC_UPSTREAM_UNAUTHORIZED",
            UpstreamError::RateLimited { .. } => "ADOC_UPSTREAM_RATE_LIMITED",
            UpstreamError::Rejected { .. } => "ADOC_UPSTREAM_REJECTED",
            UpstreamError::Unavailable { .. } => "ADOC_UPSTREAM_UNAVAILABLE",
            UpstreamError::InvalidResponse(_) => "ADOC_UPSTREAM_INVALID_RESPONSE",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::unavailable(format!("request timed out: {}", err))
        } else if err.is_decode() {
            UpstreamError::InvalidResponse(format!("failed to decode response: {}", err))
        } else {
            UpstreamError::Unavailable {
                status: err.status().map(|s| s.as_u16()),
                message: format!("HTTP request failed: {}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            UpstreamError::from_status(401, "bad key"),
            UpstreamError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            UpstreamError::from_status(429, "slow down"),
            UpstreamError::RateLimited { .. }
        ));
        assert!(matches!(
            UpstreamError::from_status(400, "bad body"),
            UpstreamError::Rejected { .. }
        ));
        assert!(matches!(
            UpstreamError::from_status(503, "overloaded"),
            UpstreamError::Unavailable { status: Some(503), .. }
        ));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(UpstreamError::from_status(429, "x").status(), Some(429));
        assert_eq!(UpstreamError::unavailable("timeout").status(), None);
        assert_eq!(UpstreamError::InvalidResponse("empty".into()).status(), None);
    }

    #[test]
    fn test_display_carries_message() {
        let err = UpstreamError::from_status(401, "Incorrect API key provided");
        assert!(err.to_string().contains("Incorrect API key provided"));
        assert_eq!(err.code(), "ADOC_UPSTREAM_UNAUTHORIZED");
    }
}
