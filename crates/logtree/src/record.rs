//! Log records and record processors
//!
//! A [`Record`] is one log event. The message starts out as a template plus
//! an ordered argument list; the first call to [`Record::message`] renders
//! the template and caches the result, so formatting work is paid at most
//! once and only when some sink actually needs the text.
//!
//! Processors are ordered callbacks that run against the mutable record
//! before dispatch. They can attach arbitrary extra attributes which the
//! core carries through untouched, including across the proxy wire:
//!
//! ```
//! use std::sync::Arc;
//! use logtree::{Hierarchy, Processor};
//!
//! let hierarchy = Hierarchy::new();
//! let processor: Processor = Arc::new(|record| {
//!     record.insert_extra("request_id", "req-42".into());
//!     Ok(())
//! });
//! hierarchy.add_default_processor(processor);
//! ```

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ProcessorError;
use crate::level::Level;

/// Record-mutating callback applied before dispatch.
///
/// Processors run synchronously, in order. The first failure aborts the
/// emit for that log call (the error surfaces from the call), never the
/// process.
pub type Processor = Arc<dyn Fn(&mut Record) -> Result<(), ProcessorError> + Send + Sync>;

/// A single log event.
#[derive(Debug, Clone)]
pub struct Record {
    /// Full dotted name of the originating logger
    name: String,
    /// Numeric severity of the event
    level: Level,
    /// When the event was created
    time: DateTime<Utc>,
    /// Message template; substituted into `rendered` on first render
    template: String,
    /// Ordered argument values, applied to the template exactly once
    args: Vec<Value>,
    /// Rendered message cache; once set, `template`/`args` are never
    /// consulted again
    rendered: OnceLock<String>,
    /// Opaque attributes attached by processors, carried through dispatch
    /// and across the proxy wire
    extra: Map<String, Value>,
}

impl Record {
    /// Create a record for a freshly logged event, timestamped now.
    pub fn new(
        name: impl Into<String>,
        level: Level,
        template: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            level,
            time: Utc::now(),
            template: template.into(),
            args,
            rendered: OnceLock::new(),
            extra: Map::new(),
        }
    }

    /// Reconstruct a record that was already rendered elsewhere (the proxy
    /// receive path). The argument list is gone; `message` returns the
    /// given string as-is.
    pub fn rendered(
        name: impl Into<String>,
        level: Level,
        time: DateTime<Utc>,
        message: impl Into<String>,
        extra: Map<String, Value>,
    ) -> Self {
        let rendered = OnceLock::new();
        let _ = rendered.set(message.into());
        Self {
            name: name.into(),
            level,
            time,
            template: String::new(),
            args: Vec::new(),
            rendered,
            extra,
        }
    }

    /// Dotted name of the logger that produced this record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Severity of this record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Symbolic level name, or the numeric value for custom severities.
    pub fn level_name(&self) -> String {
        self.level.to_string()
    }

    /// Event timestamp.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Render the message, substituting `{}` placeholders with the argument
    /// values in order.
    ///
    /// The first call formats and caches; later calls return the cached
    /// string without re-applying formatting, so rendering is idempotent
    /// even when the rendered text itself contains `{}`.
    pub fn message(&self) -> &str {
        self.rendered
            .get_or_init(|| render(&self.template, &self.args))
    }

    /// Attach an extra attribute. Later inserts under the same key win.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    /// Look up an extra attribute by key.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// All extra attributes, in insertion order.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Substitute `{}` placeholders with arguments in order. Surplus arguments
/// are appended space-separated; surplus placeholders are left verbatim.
fn render(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut values = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match values.next() {
            Some(value) => out.push_str(&display_value(value)),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);

    for value in values {
        out.push(' ');
        out.push_str(&display_value(value));
    }

    out
}

/// Strings substitute bare; everything else substitutes as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_in_order() {
        let record = Record::new(
            "app.db",
            Level::INFO,
            "query {} took {}ms",
            vec![json!("users"), json!(12)],
        );
        assert_eq!(record.message(), "query users took 12ms");
    }

    #[test]
    fn test_render_is_idempotent() {
        let record = Record::new("app", Level::INFO, "got {}", vec![json!("{}")]);
        let first = record.message().to_string();
        let second = record.message().to_string();
        // The substituted "{}" must not be re-expanded on the second call.
        assert_eq!(first, "got {}");
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_surplus_args_appended() {
        let record = Record::new(
            "app",
            Level::DEBUG,
            "worker started",
            vec![json!(1234), json!("extra")],
        );
        assert_eq!(record.message(), "worker started 1234 extra");
    }

    #[test]
    fn test_render_surplus_placeholders_kept() {
        let record = Record::new("app", Level::DEBUG, "a {} b {}", vec![json!(1)]);
        assert_eq!(record.message(), "a 1 b {}");
    }

    #[test]
    fn test_rendered_record_skips_formatting() {
        let record = Record::rendered(
            "app",
            Level::ERROR,
            Utc::now(),
            "already final {}",
            Map::new(),
        );
        assert_eq!(record.message(), "already final {}");
    }

    #[test]
    fn test_extra_attributes() {
        let mut record = Record::new("app", Level::INFO, "hello", vec![]);
        record.insert_extra("request_id", json!("req-1"));
        assert_eq!(record.extra("request_id"), Some(&json!("req-1")));
        assert_eq!(record.extra("missing"), None);
    }

    #[test]
    fn test_level_name() {
        let record = Record::new("app", Level::WARNING, "hello", vec![]);
        assert_eq!(record.level_name(), "WARNING");
    }
}
