//! # Variant Store
//!
//! Durable, append-only storage of document variants next to immutable base
//! documents. The store is the only component that touches the filesystem.

pub mod errors;
pub mod index;
pub mod variant;
pub mod variant_store;

pub use errors::{DocumentError, DocumentResult};
pub use index::VariantIndex;
pub use variant::{validate_document_name, Variant, VariantEntry, VariantId, TIMESTAMP_FORMAT};
pub use variant_store::VariantStore;
