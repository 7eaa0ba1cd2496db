//! # Edit Pipeline
//!
//! Read -> transform -> write orchestration on top of the resolver and the
//! variant store.

mod edit;
pub mod state;

pub use edit::{EditPipeline, PipelineConfig};
pub use state::{RevisionPhase, RevisionState};
