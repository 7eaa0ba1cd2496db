//! # Edit Pipeline
//!
//! `revise(name, instruction)`:
//! 1. Resolve the current content (fails fast with `NotFound`/`StorageUnavailable`)
//! 2. Send it to the transformer (fails with `Upstream`; nothing is written)
//! 3. Append the result as a new variant (fails with `StorageUnavailable`)
//!
//! No retries and no compensation: a failed revise has no side effect other
//! than wasted transformer work. Filesystem work runs on the blocking pool,
//! so dropping the future mid-append still lets the append finish whole.

use std::sync::Arc;
use std::time::Duration;

use super::state::{RevisionPhase, RevisionState};
use crate::observability::ObservationScope;
use crate::resolver::DocumentResolver;
use crate::store::{DocumentError, DocumentResult, VariantId, VariantStore};
use crate::upstream::{TextTransformer, UpstreamError};

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Deadline for the transform step. `None` relies on the transformer's own timeout.
    pub transform_timeout: Option<Duration>,
}

pub struct EditPipeline {
    store: Arc<VariantStore>,
    resolver: DocumentResolver,
    transformer: Arc<dyn TextTransformer>,
    config: PipelineConfig,
}

impl EditPipeline {
    pub fn new(store: Arc<VariantStore>, transformer: Arc<dyn TextTransformer>) -> Self {
        Self::with_config(store, transformer, PipelineConfig::default())
    }

    pub fn with_config(
        store: Arc<VariantStore>,
        transformer: Arc<dyn TextTransformer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver: DocumentResolver::new(store.clone()),
            store,
            transformer,
            config,
        }
    }

    pub fn resolver(&self) -> &DocumentResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<VariantStore> {
        &self.store
    }

    /// Revise `name` by `instruction`, returning the new variant's identifier
    pub async fn revise(&self, name: &str, instruction: &str) -> DocumentResult<VariantId> {
        let scope = ObservationScope::with_fields("REVISE", &[("document", name)]);
        let mut state = RevisionState::start();

        match self.run(&mut state, name, instruction).await {
            Ok(id) => {
                state.succeed(id.clone());
                scope.complete_with_fields(&[("variant", id.as_str())]);
                Ok(id)
            }
            Err(err) => {
                let phase = state
                    .fail(err.to_string())
                    .unwrap_or(RevisionPhase::Resolving);
                scope.fail(
                    &err.to_string(),
                    &[("phase", phase.as_str()), ("code", err.code())],
                );
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        state: &mut RevisionState,
        name: &str,
        instruction: &str,
    ) -> DocumentResult<VariantId> {
        let resolver = self.resolver.clone();
        let doc_name = name.to_string();
        let content = run_blocking(move || resolver.current(&doc_name)).await?;

        state.advance();
        let transformed = self.transform(&content, instruction).await?;

        state.advance();
        let store = self.store.clone();
        let doc_name = name.to_string();
        run_blocking(move || store.append_variant(&doc_name, &transformed)).await
    }

    async fn transform(&self, content: &[u8], instruction: &str) -> DocumentResult<Vec<u8>> {
        let call = self.transformer.transform(content, instruction);

        let output = match self.config.transform_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                UpstreamError::unavailable(format!(
                    "transformer did not answer within {}ms",
                    limit.as_millis()
                ))
            })??,
            None => call.await?,
        };

        if output.iter().all(u8::is_ascii_whitespace) {
            return Err(UpstreamError::InvalidResponse("transformer returned no content".into()).into());
        }
        Ok(output)
    }
}

async fn run_blocking<T, F>(f: F) -> DocumentResult<T>
where
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocumentError::storage_no_source(format!("storage task failed: {}", e)))?
}
