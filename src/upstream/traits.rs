//! Collaborator contracts consumed by the pipeline and the HTTP layer.
//!
//! Each call is a single atomic external request with no partial results.

use async_trait::async_trait;

use super::errors::UpstreamResult;

/// Rewrites document content according to a natural-language instruction.
#[async_trait]
pub trait TextTransformer: Send + Sync {
    /// Return the transformed content. Empty output is the caller's concern.
    async fn transform(&self, content: &[u8], instruction: &str) -> UpstreamResult<Vec<u8>>;
}

/// Turns recorded speech into text.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>) -> UpstreamResult<String>;
}
