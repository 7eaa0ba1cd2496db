//! VariantIndex - in-memory map from document name to its ordered variants
//!
//! Built once from a scan of the variant root and updated on every append.
//! Each per-document list is kept sorted by `(created_at, sequence)`.
//! This is a data container: it never touches the filesystem.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::variant::Variant;

#[derive(Debug, Default, Clone)]
pub struct VariantIndex {
    documents: HashMap<String, Vec<Variant>>,
}

impl VariantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variant at its ordered position. Re-inserting the same
    /// `(created_at, sequence)` replaces the previous entry.
    pub fn insert(&mut self, variant: Variant) {
        let chain = self
            .documents
            .entry(variant.document().to_string())
            .or_default();

        match chain.binary_search_by_key(&variant.ordering_key(), Variant::ordering_key) {
            Ok(pos) => chain[pos] = variant,
            Err(pos) => chain.insert(pos, variant),
        }
    }

    /// Variants of `document`, oldest first
    pub fn variants(&self, document: &str) -> &[Variant] {
        self.documents
            .get(document)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Newest variant of `document`
    pub fn latest(&self, document: &str) -> Option<&Variant> {
        self.variants(document).last()
    }

    /// First sequence number not yet used by `document` at `created_at`
    pub fn next_sequence(&self, document: &str, created_at: NaiveDateTime) -> u32 {
        self.variants(document)
            .iter()
            .filter(|v| v.created_at() == created_at)
            .map(|v| v.sequence() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of variants across all documents
    pub fn len(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
