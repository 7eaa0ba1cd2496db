//! CLI-specific error types
//!
//! Every CLI error is fatal: printed to stderr, exit code 1.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::store::DocumentError;
use crate::upstream::UpstreamError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, runtime)
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Boot failed
    BootFailed,
    /// Document or revision operation failed
    DocumentError,
    /// Transformer or transcriber failed
    UpstreamError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ADOC_CLI_CONFIG_ERROR",
            Self::IoError => "ADOC_CLI_IO_ERROR",
            Self::AlreadyInitialized => "ADOC_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "ADOC_CLI_NOT_INITIALIZED",
            Self::BootFailed => "ADOC_CLI_BOOT_FAILED",
            Self::DocumentError => "ADOC_CLI_DOCUMENT_ERROR",
            Self::UpstreamError => "ADOC_CLI_UPSTREAM_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Already initialized
    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Document directories already initialized",
        )
    }

    /// Not initialized
    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Document directories not initialized. Run 'adocflow init' first.",
        )
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<UpstreamError> for CliError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::MissingCredential(_) => Self::config_error(e.to_string()),
            other => Self::new(CliErrorCode::UpstreamError, other.to_string()),
        }
    }
}

impl From<DocumentError> for CliError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::Upstream(inner) => inner.into(),
            other => Self::new(
                CliErrorCode::DocumentError,
                format!("{} ({})", other, other.code()),
            ),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let e = CliError::not_initialized();
        assert!(e.to_string().starts_with("ADOC_CLI_NOT_INITIALIZED: "));
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let e: CliError = DocumentError::Upstream(UpstreamError::MissingCredential(
            "no key".into(),
        ))
        .into();
        assert_eq!(e.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_not_found_keeps_document_code() {
        let e: CliError = DocumentError::NotFound("report".into()).into();
        assert_eq!(e.code_str(), "ADOC_CLI_DOCUMENT_ERROR");
        assert!(e.message().contains("ADOC_NOT_FOUND"));
    }
}
