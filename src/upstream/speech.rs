//! Whisper-style speech transcriber.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::client::{error_from_response, OpenAiClient, OpenAiSettings};
use super::errors::UpstreamResult;
use super::traits::SpeechTranscriber;
use crate::observability::{log_event_with_fields, Event};

/// Default transcription model
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

const TRANSCRIPTIONS_PATH: &str = "/v1/audio/transcriptions";
const UPLOAD_FILE_NAME: &str = "openai.mp3";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// `SpeechTranscriber` backed by an OpenAI-compatible transcription endpoint
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    client: OpenAiClient,
    model: String,
}

impl WhisperTranscriber {
    /// Fails with `MissingCredential` when the settings carry no API key
    pub fn new(settings: &OpenAiSettings, model: impl Into<String>) -> UpstreamResult<Self> {
        Ok(Self {
            client: OpenAiClient::new(settings)?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl SpeechTranscriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> UpstreamResult<String> {
        let audio_bytes = audio.len().to_string();
        let form = Form::new()
            .part("file", Part::bytes(audio).file_name(UPLOAD_FILE_NAME))
            .text("model", self.model.clone());

        let response = self
            .client
            .post(TRANSCRIPTIONS_PATH)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: TranscriptionResponse = response.json().await?;

        let chars = body.text.chars().count().to_string();
        log_event_with_fields(
            Event::TranscriptionComplete,
            &[("audio_bytes", &audio_bytes), ("text_chars", &chars)],
        );

        Ok(body.text)
    }
}
