//! Serialized record format for the proxy wire
//!
//! A [`WireRecord`] is the line-level payload: the subset of a [`Record`]
//! that survives crossing a process boundary. The message is always the
//! final rendered string — the receiving process has no access to the
//! original argument values, so clients render before serializing and
//! reconstructed records are born rendered with no argument list.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LogError, LogResult};
use crate::level::Level;
use crate::record::Record;

/// Self-describing wire form of one record.
///
/// Extra processor-attached attributes are flattened into the top-level
/// object, so a payload reads like
/// `{"name":"app.db","level":40,"ts":1700000000000,"msg":"...","request_id":"req-9"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecord {
    /// Originating logger's full dotted name
    pub name: String,
    /// Numeric severity
    pub level: u32,
    /// Event timestamp, milliseconds since the Unix epoch
    pub ts: i64,
    /// Fully rendered message
    pub msg: String,
    /// Opaque extra attributes, carried through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireRecord {
    /// Capture a record for transmission, forcing the message to render.
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name().to_string(),
            level: record.level().value(),
            ts: record.time().timestamp_millis(),
            msg: record.message().to_string(),
            extra: record.extras().clone(),
        }
    }

    /// Encode to a single JSON line (no trailing newline). serde_json
    /// escapes any newline inside a field, so the result never spans lines.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse one line as a wire record.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Rebuild a dispatchable record: original timestamp reconstituted,
    /// message final, argument list gone.
    ///
    /// # Errors
    ///
    /// `LogError::MalformedRecord` when the payload carries a zero level or
    /// an out-of-range timestamp.
    pub fn into_record(self) -> LogResult<Record> {
        let level = Level::new(self.level)
            .ok_or_else(|| LogError::MalformedRecord(format!("unusable level {}", self.level)))?;
        let time = DateTime::from_timestamp_millis(self.ts)
            .ok_or_else(|| LogError::MalformedRecord(format!("unusable timestamp {}", self.ts)))?;
        Ok(Record::rendered(self.name, level, time, self.msg, self.extra))
    }
}
