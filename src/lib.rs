//! adocflow - versioned AsciiDoc documents revised by natural-language instruction
//!
//! Base documents are immutable. Every revision is stored as a new
//! timestamped variant next to them, and the current content of a document
//! is always its newest variant, or the base when there is none.
//!
//! - [`store`]: durable append-only variant storage
//! - [`resolver`]: current-content resolution
//! - [`pipeline`]: resolve -> transform -> append
//! - [`upstream`], [`render`]: external collaborators
//! - [`http_server`], [`cli`]: outer surfaces

pub mod cli;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod store;
pub mod upstream;

pub use pipeline::EditPipeline;
pub use resolver::DocumentResolver;
pub use store::{DocumentError, DocumentResult, VariantId, VariantStore};
