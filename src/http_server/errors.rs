//! HTTP error responses
//!
//! Every failure leaves the server as `{"error": <message>, "code": <status>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::observability::{log_event_with_fields, Event};
use crate::render::RenderError;
use crate::store::DocumentError;
use crate::upstream::UpstreamError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Handler error carrying the status it maps to
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.to_string())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        DocumentError::from(e).into()
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status.as_u16().to_string();
        if self.status.is_server_error() {
            log_event_with_fields(
                Event::RequestFailed,
                &[("code", &code), ("error", &self.message)],
            );
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.status.as_u16(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_statuses() {
        assert_eq!(
            ApiError::from(DocumentError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DocumentError::storage_no_source("disk gone")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(UpstreamError::unavailable("down")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_render_error_is_internal() {
        assert_eq!(
            ApiError::from(RenderError::EmptyOutput).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let json = serde_json::to_value(ErrorResponse {
            error: "document not found: report".into(),
            code: 404,
        })
        .unwrap();
        assert_eq!(json["code"], 404);
    }
}
