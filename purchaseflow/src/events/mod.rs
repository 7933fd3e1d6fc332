//! Event sinks for pipeline observability.
//!
//! A sink is handed to the pipeline explicitly; there is no process-wide
//! default. [`NoOpEventSink`] is used when none is configured.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
