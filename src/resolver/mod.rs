//! # Document Resolver
//!
//! Single source of truth for the current content of a document:
//! 1. The newest variant by `(created_at, sequence)`, if any exists
//! 2. Otherwise the base document
//! 3. Otherwise `NotFound`
//!
//! Read-only. No caching beyond the store's index.

use std::sync::Arc;

use serde::Serialize;

use crate::store::{DocumentResult, VariantId, VariantStore};

/// Where the resolved content came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variant", rename_all = "snake_case")]
pub enum ContentSource {
    Base,
    Variant(VariantId),
}

/// Current content of a document together with its source
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub name: String,
    pub content: Vec<u8>,
    pub source: ContentSource,
}

#[derive(Debug, Clone)]
pub struct DocumentResolver {
    store: Arc<VariantStore>,
}

impl DocumentResolver {
    pub fn new(store: Arc<VariantStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<VariantStore> {
        &self.store
    }

    /// Current content of `name`
    pub fn current(&self, name: &str) -> DocumentResult<Vec<u8>> {
        self.resolve(name).map(|doc| doc.content)
    }

    /// Current content of `name` and whether it came from a variant or the base
    pub fn resolve(&self, name: &str) -> DocumentResult<ResolvedDocument> {
        if let Some(latest) = self.store.latest_variant(name)? {
            let content = self.store.read_variant(&latest)?;
            return Ok(ResolvedDocument {
                name: name.to_string(),
                content,
                source: ContentSource::Variant(latest.id().clone()),
            });
        }

        let content = self.store.read_base(name)?;
        Ok(ResolvedDocument {
            name: name.to_string(),
            content,
            source: ContentSource::Base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentError;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentResolver) {
        let temp = TempDir::new().unwrap();
        let store = VariantStore::open(temp.path().join("adocs"), temp.path().join("work"), "adoc")
            .unwrap();
        (temp, DocumentResolver::new(Arc::new(store)))
    }

    #[test]
    fn test_falls_back_to_base() {
        let (_temp, resolver) = setup();
        fs::write(resolver.store().base_dir().join("report.adoc"), "Hello").unwrap();

        let doc = resolver.resolve("report").unwrap();
        assert_eq!(doc.content, b"Hello");
        assert_eq!(doc.source, ContentSource::Base);
    }

    #[test]
    fn test_latest_variant_wins() {
        let (_temp, resolver) = setup();
        fs::write(resolver.store().base_dir().join("report.adoc"), "Hello").unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        let store = resolver.store();
        store
            .append_variant_at("report", b"later", day.and_hms_opt(10, 0, 1).unwrap())
            .unwrap();
        let earlier = store
            .append_variant_at("report", b"earlier", day.and_hms_opt(10, 0, 0).unwrap())
            .unwrap();
        assert_eq!(earlier.as_str(), "report_20240202_100000");

        let doc = resolver.resolve("report").unwrap();
        assert_eq!(doc.content, b"later");
        assert_eq!(
            doc.source,
            ContentSource::Variant(store.list_variants("report").unwrap()[1].id().clone())
        );
    }

    #[test]
    fn test_variant_without_base() {
        let (_temp, resolver) = setup();
        resolver.store().append_variant("orphan", b"only variant").unwrap();
        assert_eq!(resolver.current("orphan").unwrap(), b"only variant");
    }

    #[test]
    fn test_not_found() {
        let (_temp, resolver) = setup();
        assert!(matches!(
            resolver.current("nothing"),
            Err(DocumentError::NotFound(ref n)) if n == "nothing"
        ));
    }

    #[test]
    fn test_content_source_serialization() {
        let json = serde_json::to_value(ContentSource::Base).unwrap();
        assert_eq!(json["kind"], "base");
    }
}
