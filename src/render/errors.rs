//! # Render Errors

use thiserror::Error;

/// Result type for rendering
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer process could not be started (binary missing, permissions)
    #[error("Failed to start renderer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe I/O with the renderer failed
    #[error("Renderer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The renderer exited unsuccessfully
    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The renderer succeeded but wrote nothing
    #[error("Renderer produced no output")]
    EmptyOutput,
}

impl RenderError {
    pub fn code(&self) -> &'static str {
        match self {
            RenderError::Spawn { .. } => "ADOC_RENDER_SPAWN_FAILED",
            RenderError::Io(_) => "ADOC_RENDER_IO_ERROR",
            RenderError::Failed { .. } => "ADOC_RENDER_FAILED",
            RenderError::EmptyOutput => "ADOC_RENDER_EMPTY_OUTPUT",
        }
    }
}
