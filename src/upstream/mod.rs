//! # Upstream Collaborators
//!
//! - `TextTransformer`: rewrites a document given an instruction
//! - `SpeechTranscriber`: turns recorded audio into text
//!
//! Concrete clients speak the OpenAI HTTP API. Credentials are passed in
//! through `OpenAiSettings`; nothing here reads the environment.

mod client;
pub mod chat;
pub mod errors;
pub mod speech;
pub mod traits;

pub use chat::{ChatTransformer, DEFAULT_CHAT_MODEL, DEFAULT_MAX_TOKENS};
pub use client::{OpenAiSettings, DEFAULT_API_BASE};
pub use errors::{UpstreamError, UpstreamResult};
pub use speech::{WhisperTranscriber, DEFAULT_TRANSCRIPTION_MODEL};
pub use traits::{SpeechTranscriber, TextTransformer};
