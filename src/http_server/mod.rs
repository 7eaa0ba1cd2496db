//! # HTTP Server Module
//!
//! Axum server exposing documents to the browser front end.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/list` - Base document names
//! - `/adoc/:name`, `/pdf/:name` - Current content as source or PDF
//! - `/pdf/:name/change` - Revise a document by instruction
//! - `/variants/:name` - Revision history
//! - `/speech-to-text` - Transcribe a recorded prompt

pub mod config;
pub mod errors;
pub mod routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use routes::AppState;
pub use server::HttpServer;
