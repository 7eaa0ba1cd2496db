//! # Document Errors
//!
//! Error codes:
//! - ADOC_NOT_FOUND: neither a base document nor any variant exists
//! - ADOC_INVALID_NAME: the document name cannot be mapped to a file
//! - ADOC_STORAGE_UNAVAILABLE: a storage root cannot be read, written or created
//! - ADOC_UPSTREAM_ERROR: the transformer failed or produced nothing usable
//!
//! Malformed variant entries are not an error. They are skipped and logged.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::upstream::UpstreamError;

/// Result type for store, resolver and pipeline operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors surfaced by the versioned document core
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl DocumentError {
    /// Storage failure with an underlying I/O error
    pub fn storage(message: impl Into<String>, source: io::Error) -> Self {
        DocumentError::StorageUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Storage failure at a path
    pub fn storage_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::storage(format!("{} {}: {}", action, path.display(), source), source)
    }

    /// Storage failure without an I/O source
    pub fn storage_no_source(message: impl Into<String>) -> Self {
        DocumentError::StorageUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::NotFound(_) => "ADOC_NOT_FOUND",
            DocumentError::InvalidName { .. } => "ADOC_INVALID_NAME",
            DocumentError::StorageUnavailable { .. } => "ADOC_STORAGE_UNAVAILABLE",
            DocumentError::Upstream(_) => "ADOC_UPSTREAM_ERROR",
        }
    }

    /// HTTP status code equivalent
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentError::NotFound(_) => 404,
            DocumentError::InvalidName { .. } => 400,
            DocumentError::StorageUnavailable { .. } => 500,
            DocumentError::Upstream(_) => 502,
        }
    }

    /// Returns true for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DocumentError::NotFound("report".into()).status_code(), 404);
        assert_eq!(
            DocumentError::InvalidName {
                name: "../x".into(),
                reason: "contains a path separator"
            }
            .status_code(),
            400
        );
        assert_eq!(DocumentError::storage_no_source("disk gone").status_code(), 500);
        assert_eq!(
            DocumentError::from(UpstreamError::InvalidResponse("empty".into())).status_code(),
            502
        );
    }

    #[test]
    fn test_storage_error_keeps_source() {
        use std::error::Error as _;

        let err = DocumentError::storage(
            "write failed",
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert_eq!(err.code(), "ADOC_STORAGE_UNAVAILABLE");
        assert!(err.source().is_some());
        assert!(err.to_string().contains("write failed"));
    }
}
