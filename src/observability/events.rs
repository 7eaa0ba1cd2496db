//! Observable events
//!
//! Events are explicit and typed so log consumers can rely on stable names.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Process startup begins
    BootStart,
    /// Startup complete
    BootComplete,
    /// Configuration loaded
    ConfigLoaded,
    /// HTTP listener bound and serving
    Serving,
    /// Shutdown complete
    ShutdownComplete,

    // Store
    /// Variant index built from disk
    StoreOpened,
    /// Variant written and linked into place
    VariantAppended,
    /// A revision-shaped entry was excluded from a listing
    VariantSkipped,
    /// A staging file could not be removed after an append
    TempCleanupFailed,

    // Upstream collaborators
    /// Transformation request sent
    TransformRequest,
    /// Transformation response received
    TransformResponse,
    /// Transcription finished
    TranscriptionComplete,

    // Rendering
    /// Rendering finished
    RenderComplete,
    /// Renderer failed
    RenderFailed,

    // HTTP
    /// A request ended in a server-side error
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ADOCFLOW_STARTUP_BEGIN",
            Event::BootComplete => "ADOCFLOW_STARTUP_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "ADOCFLOW_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::StoreOpened => "STORE_OPENED",
            Event::VariantAppended => "VARIANT_APPENDED",
            Event::VariantSkipped => "VARIANT_SKIPPED",
            Event::TempCleanupFailed => "TEMP_CLEANUP_FAILED",

            Event::TransformRequest => "TRANSFORM_REQUEST",
            Event::TransformResponse => "TRANSFORM_RESPONSE",
            Event::TranscriptionComplete => "TRANSCRIPTION_COMPLETE",

            Event::RenderComplete => "RENDER_COMPLETE",
            Event::RenderFailed => "RENDER_FAILED",

            Event::RequestFailed => "HTTP_REQUEST_FAILED",
        }
    }

    /// Events that describe a skipped or failed unit of work
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::VariantSkipped
                | Event::TempCleanupFailed
                | Event::RenderFailed
                | Event::RequestFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
