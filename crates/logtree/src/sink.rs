//! Sink and formatter capabilities
//!
//! The core dispatches records to [`Sink`] implementations and knows nothing
//! else about them. A sink may declare its own minimum level (checked per
//! record during dispatch, independently of logger levels) and may support
//! [`Sink::reset`] to reopen underlying resources, e.g. after an external
//! log rotation. Resets only happen through the explicit
//! [`Hierarchy::reset_sinks`](crate::Hierarchy::reset_sinks) sweep, never
//! automatically.

use std::io;

use crate::level::Level;
use crate::record::Record;

/// A destination capability that consumes records.
pub trait Sink: Send + Sync {
    /// Deliver one record.
    ///
    /// Implementations must not panic for a well-formed record. An `Err`
    /// return is isolated by the dispatcher: it is reported to stderr and
    /// the remaining sinks in the same dispatch pass still receive the
    /// record.
    fn handle(&self, record: &Record) -> io::Result<()>;

    /// Minimum severity this sink accepts. `None` means unfiltered.
    fn level(&self) -> Option<Level> {
        None
    }

    /// Reopen underlying resources. Default is a no-op.
    fn reset(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Formats a record to a string, used by sink implementations.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record) -> String;
}

/// `time - LEVEL - message` formatting.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, record: &Record) -> String {
        format!(
            "{} - {} - {}",
            record.time().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            record.level_name(),
            record.message()
        )
    }
}
