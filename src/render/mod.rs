//! # Rendering
//!
//! Turns resolved AsciiDoc content into a presentation format. Used
//! downstream of the document core, never by it.

pub mod asciidoctor;
pub mod errors;

use async_trait::async_trait;

pub use asciidoctor::AsciidoctorRenderer;
pub use errors::{RenderError, RenderResult};

/// Opaque content-to-PDF capability
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, content: &[u8]) -> RenderResult<Vec<u8>>;
}
