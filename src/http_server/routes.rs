//! Document HTTP Routes
//!
//! Listing, source, rendered PDF, revision and voice-prompt endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use crate::pipeline::EditPipeline;
use crate::render::PdfRenderer;
use crate::resolver::DocumentResolver;
use crate::store::{DocumentResult, Variant};
use crate::upstream::SpeechTranscriber;

/// Multipart field carrying the recorded prompt
pub const VOICE_PROMPT_FIELD: &str = "voicePrompt";

// ==================
// Shared State
// ==================

pub struct AppState {
    pub resolver: DocumentResolver,
    pub pipeline: EditPipeline,
    pub renderer: Arc<dyn PdfRenderer>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
}

impl AppState {
    pub fn new(
        pipeline: EditPipeline,
        renderer: Arc<dyn PdfRenderer>,
        transcriber: Arc<dyn SpeechTranscriber>,
    ) -> Self {
        Self {
            resolver: pipeline.resolver().clone(),
            pipeline,
            renderer,
            transcriber,
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentsListResponse {
    pub documents: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub variant: String,
}

#[derive(Debug, Serialize)]
pub struct VariantResponse {
    pub id: String,
    pub created_at: String,
    pub sequence: u32,
}

impl From<&Variant> for VariantResponse {
    fn from(v: &Variant) -> Self {
        Self {
            id: v.id().to_string(),
            created_at: v.created_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
            sequence: v.sequence(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantsListResponse {
    pub variants: Vec<VariantResponse>,
    pub total: usize,
}

// ==================
// Router
// ==================

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

pub fn document_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/list", get(list_handler))
        .route("/adoc/:name", get(adoc_handler))
        .route("/pdf/:name", get(pdf_handler))
        .route("/pdf/:name/change", post(change_handler))
        .route("/variants/:name", get(variants_handler))
        .route("/speech-to-text", post(speech_to_text_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DocumentsListResponse>, ApiError> {
    let resolver = state.resolver.clone();
    let documents = blocking(move || resolver.store().list_documents()).await?;

    Ok(Json(DocumentsListResponse {
        total: documents.len(),
        documents,
    }))
}

async fn adoc_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resolver = state.resolver.clone();
    let content = blocking(move || resolver.current(&name)).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Bytes::from(content),
    ))
}

async fn pdf_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resolver = state.resolver.clone();
    let content = blocking(move || resolver.current(&name)).await?;
    let pdf = state.renderer.render(&content).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=output.pdf"),
        ],
        Bytes::from(pdf),
    ))
}

async fn change_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<ChangeRequest>, JsonRejection>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt must not be empty"));
    }

    let id = state.pipeline.revise(&name, &request.prompt).await?;

    Ok(Json(ChangeResponse {
        variant: id.to_string(),
    }))
}

async fn variants_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<VariantsListResponse>, ApiError> {
    let resolver = state.resolver.clone();
    let variants = blocking(move || resolver.store().list_variants(&name)).await?;

    Ok(Json(VariantsListResponse {
        total: variants.len(),
        variants: variants.iter().map(VariantResponse::from).collect(),
    }))
}

async fn speech_to_text_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart form: {}", e)))?
    {
        if field.name() != Some(VOICE_PROMPT_FIELD) {
            continue;
        }
        let audio = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read voice prompt: {}", e)))?;
        if audio.is_empty() {
            return Err(ApiError::bad_request("voice prompt is empty"));
        }

        let text = state.transcriber.transcribe(audio.to_vec()).await?;
        return Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text));
    }

    Err(ApiError::bad_request(format!(
        "missing multipart field '{}'",
        VOICE_PROMPT_FIELD
    )))
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("storage task failed: {}", e)))?;
    Ok(result?)
}
