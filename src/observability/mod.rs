//! Observability: structured logging for adocflow
//!
//! - Structured logs (JSON lines, deterministic key ordering)
//! - Typed lifecycle events
//! - Begin/complete scopes around units of work
//!
//! ```ignore
//! use adocflow::observability::{Event, Logger};
//!
//! Logger::info(Event::VariantAppended.as_str(), &[("document", "report")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::BootStart);
        log_event(Event::BootComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::VariantSkipped, &[("file", "report_garbage.adoc")]);
    }
}
