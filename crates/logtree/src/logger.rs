//! Logger handles: level gating, record creation, dispatch
//!
//! A [`Logger`] is a cheap handle onto one node of a
//! [`Hierarchy`](crate::Hierarchy)'s tree.
//! Emitting goes through [`Logger::log`]: the call is gated once, at the
//! origin, against the logger's effective level; accepted records run the
//! processor chain, ship over the proxy when one is attached, and then walk
//! the ancestor chain offering themselves to every sink along the way.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{LogError, LogResult};
use crate::hierarchy::{NodeId, Shared};
use crate::level::Level;
use crate::record::{Processor, Record};
use crate::sink::Sink;

/// Named node in the namespace tree that can filter and route records.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    id: NodeId,
    name: Arc<str>,
}

impl Logger {
    pub(crate) fn new(shared: Arc<Shared>, id: NodeId, name: impl AsRef<str>) -> Self {
        Self {
            shared,
            id,
            name: Arc::from(name.as_ref()),
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// Full dotted name of this logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent logger, or `None` for the root.
    pub fn parent(&self) -> Option<Logger> {
        let registry = self.shared.registry.read();
        let parent = registry.node(self.id).parent?;
        let name = registry.node(parent).name.clone();
        drop(registry);
        Some(Logger::new(self.shared.clone(), parent, name))
    }

    /// The level configured directly on this logger, if any.
    pub fn level(&self) -> Option<Level> {
        self.shared.registry.read().node(self.id).level
    }

    /// Configure this logger's minimum severity.
    pub fn set_level(&self, level: Level) {
        self.shared.registry.write().node_mut(self.id).level = Some(level);
    }

    /// Remove this logger's own level so it inherits again.
    pub fn clear_level(&self) {
        self.shared.registry.write().node_mut(self.id).level = None;
    }

    /// Configure the level by symbolic name. Unknown names resolve to an
    /// unset level, per the level table contract.
    pub fn set_level_name(&self, name: &str) {
        match Level::parse(name) {
            Some(level) => self.set_level(level),
            None => self.clear_level(),
        }
    }

    /// The threshold this logger actually filters with: its own level, or
    /// the nearest configured ancestor's. `None` means no level is
    /// configured anywhere up to the root — effectively unfiltered.
    pub fn effective_level(&self) -> Option<Level> {
        self.shared.registry.read().effective_level(self.id)
    }

    /// Whether a record at `level` would pass this logger's gate.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        match self.effective_level() {
            Some(threshold) => level >= threshold,
            None => true,
        }
    }

    /// Whether accepted records are forwarded to the parent's sinks.
    pub fn propagate(&self) -> bool {
        self.shared.registry.read().node(self.id).propagate
    }

    /// Stop (or resume) forwarding accepted records to ancestor sinks.
    pub fn set_propagate(&self, propagate: bool) {
        self.shared.registry.write().node_mut(self.id).propagate = propagate;
    }

    /// Attach a sink owned by this logger alone.
    pub fn add_sink(&self, sink: impl Sink + 'static) {
        self.add_shared_sink(Arc::new(sink));
    }

    /// Attach a sink that may also be attached elsewhere. Shared sinks are
    /// deduplicated by the [`Hierarchy::reset_sinks`](crate::Hierarchy::reset_sinks)
    /// sweep.
    pub fn add_shared_sink(&self, sink: Arc<dyn Sink>) {
        self.shared
            .registry
            .write()
            .node_mut(self.id)
            .sinks
            .push(sink);
    }

    /// Append a processor to this logger's chain. It runs after the
    /// hierarchy defaults that were attached at creation time.
    pub fn add_processor(&self, processor: Processor) {
        self.shared
            .registry
            .write()
            .node_mut(self.id)
            .processors
            .push(processor);
    }

    /// Emit a record at `level`.
    ///
    /// The call is gated once, here, against [`Logger::effective_level`];
    /// ancestors are not re-gated during dispatch. Below-threshold calls
    /// return without building a record.
    ///
    /// # Errors
    ///
    /// `LogError::Processor` when a processor fails (the emit is aborted);
    /// `LogError::Io` when an attached proxy fails to send — local dispatch
    /// has still run in that case.
    pub fn log(&self, level: Level, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }

        let mut record = Record::new(self.name.as_ref(), level, msg, args);

        let processors = self.shared.registry.read().processors(self.id);
        for processor in &processors {
            processor(&mut record).map_err(LogError::Processor)?;
        }

        let sent = match self.shared.proxy.read().as_ref() {
            Some(client) => client.send(&record),
            None => Ok(()),
        };

        self.dispatch(&record);
        sent
    }

    pub fn trace(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::TRACE, msg, args)
    }

    pub fn debug(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::DEBUG, msg, args)
    }

    pub fn info(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::INFO, msg, args)
    }

    pub fn warning(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::WARNING, msg, args)
    }

    /// Alias for [`Logger::warning`].
    pub fn warn(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.warning(msg, args)
    }

    pub fn error(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::ERROR, msg, args)
    }

    pub fn critical(&self, msg: impl Into<String>, args: Vec<Value>) -> LogResult<()> {
        self.log(Level::CRITICAL, msg, args)
    }

    /// Offer a record to this logger's sinks and each ancestor's in turn,
    /// while `propagate` holds, applying per-sink level filters.
    ///
    /// This is also the re-injection point for records arriving over the
    /// proxy: they already passed their origin gate, so dispatch applies no
    /// further logger-level check. A failing sink is reported to stderr and
    /// does not stop delivery to the remaining sinks.
    pub fn dispatch(&self, record: &Record) {
        let sinks = self.shared.registry.read().dispatch_sinks(self.id);
        for sink in sinks {
            if let Some(min) = sink.level() {
                if record.level() < min {
                    continue;
                }
            }
            if let Err(err) = sink.handle(record) {
                // Last-resort reporting; never routed back through the tree.
                eprintln!("logtree: sink error: {err}");
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Logger {}

/// Convenience: look up a logger on the process-wide default hierarchy.
pub fn get_logger(name: &str) -> LogResult<Logger> {
    crate::default_hierarchy().logger(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Test sink that remembers every record offered to it.
    #[derive(Default)]
    struct CollectingSink {
        level: Option<Level>,
        seen: Mutex<Vec<String>>,
    }

    impl CollectingSink {
        fn with_level(level: Level) -> Self {
            Self {
                level: Some(level),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    impl Sink for CollectingSink {
        fn handle(&self, record: &Record) -> std::io::Result<()> {
            self.seen.lock().push(record.message().to_string());
            Ok(())
        }

        fn level(&self) -> Option<Level> {
            self.level
        }
    }

    #[test]
    fn test_effective_level_inherits_from_nearest_ancestor() {
        let hierarchy = Hierarchy::new();
        let a = hierarchy.logger("a").unwrap();
        let abc = hierarchy.logger("a.b.c").unwrap();

        // Nothing configured below root: inherit root's INFO default.
        assert_eq!(abc.effective_level(), Some(Level::INFO));

        a.set_level(Level::ERROR);
        assert_eq!(abc.effective_level(), Some(Level::ERROR));

        let ab = hierarchy.logger("a.b").unwrap();
        ab.set_level(Level::DEBUG);
        assert_eq!(abc.effective_level(), Some(Level::DEBUG));

        abc.set_level(Level::CRITICAL);
        assert_eq!(abc.effective_level(), Some(Level::CRITICAL));
    }

    #[test]
    fn test_unfiltered_when_no_level_anywhere() {
        let hierarchy = Hierarchy::new();
        hierarchy.root().clear_level();
        let leaf = hierarchy.logger("a.b").unwrap();
        assert_eq!(leaf.effective_level(), None);
        assert!(leaf.is_enabled_for(Level::TRACE));
    }

    #[test]
    fn test_gate_blocks_below_threshold() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let sink = Arc::new(CollectingSink::default());
        logger.add_shared_sink(sink.clone());

        logger.debug("dropped", vec![]).unwrap();
        logger.info("kept", vec![]).unwrap();

        assert_eq!(sink.messages(), ["kept"]);
    }

    #[test]
    fn test_record_reaches_ancestor_sinks() {
        let hierarchy = Hierarchy::new();
        let parent = hierarchy.logger("app").unwrap();
        let child = hierarchy.logger("app.db").unwrap();
        let root_sink = Arc::new(CollectingSink::default());
        let parent_sink = Arc::new(CollectingSink::default());
        hierarchy.root().add_shared_sink(root_sink.clone());
        parent.add_shared_sink(parent_sink.clone());

        child.info("hello", vec![]).unwrap();

        assert_eq!(parent_sink.messages(), ["hello"]);
        assert_eq!(root_sink.messages(), ["hello"]);
    }

    #[test]
    fn test_propagate_false_cuts_off_ancestors() {
        let hierarchy = Hierarchy::new();
        let parent = hierarchy.logger("app").unwrap();
        let child = hierarchy.logger("app.db").unwrap();
        let parent_sink = Arc::new(CollectingSink::default());
        let root_sink = Arc::new(CollectingSink::default());
        parent.add_shared_sink(parent_sink.clone());
        hierarchy.root().add_shared_sink(root_sink.clone());

        parent.set_propagate(false);
        child.info("hello", vec![]).unwrap();

        // The cut happens *at* the non-propagating ancestor: its own sinks
        // still run, the root's do not.
        assert_eq!(parent_sink.messages(), ["hello"]);
        assert!(root_sink.messages().is_empty());
    }

    #[test]
    fn test_sink_level_filters_independently() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let all = Arc::new(CollectingSink::default());
        let errors_only = Arc::new(CollectingSink::with_level(Level::ERROR));
        logger.add_shared_sink(all.clone());
        logger.add_shared_sink(errors_only.clone());

        logger.info("fine", vec![]).unwrap();
        logger.error("bad", vec![]).unwrap();

        assert_eq!(all.messages(), ["fine", "bad"]);
        assert_eq!(errors_only.messages(), ["bad"]);
    }

    #[test]
    fn test_ancestors_not_regated() {
        let hierarchy = Hierarchy::new();
        let parent = hierarchy.logger("app").unwrap();
        let child = hierarchy.logger("app.db").unwrap();
        let parent_sink = Arc::new(CollectingSink::default());
        parent.add_shared_sink(parent_sink.clone());

        // Parent demands CRITICAL, child allows DEBUG. Gating happens only
        // at the origin, so the parent's sinks still see the record.
        parent.set_level(Level::CRITICAL);
        child.set_level(Level::DEBUG);
        child.debug("made it", vec![]).unwrap();

        assert_eq!(parent_sink.messages(), ["made it"]);
    }

    #[test]
    fn test_processor_failure_aborts_emit() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let sink = Arc::new(CollectingSink::default());
        logger.add_shared_sink(sink.clone());
        logger.add_processor(Arc::new(|_record| Err("processor down".into())));

        let err = logger.info("never delivered", vec![]).unwrap_err();
        assert!(matches!(err, LogError::Processor(_)));
        assert!(sink.messages().is_empty());

        // Hierarchy state is intact; removing nothing, logging still works
        // for a sibling logger.
        let other = hierarchy.logger("app2").unwrap();
        let other_sink = Arc::new(CollectingSink::default());
        other.add_shared_sink(other_sink.clone());
        other.info("still fine", vec![]).unwrap();
        assert_eq!(other_sink.messages(), ["still fine"]);
    }

    #[test]
    fn test_processor_attaches_extra_seen_by_sink() {
        struct ExtraSink {
            seen: Mutex<Vec<Option<Value>>>,
        }
        impl Sink for ExtraSink {
            fn handle(&self, record: &Record) -> std::io::Result<()> {
                self.seen.lock().push(record.extra("request_id").cloned());
                Ok(())
            }
        }

        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let sink = Arc::new(ExtraSink {
            seen: Mutex::new(Vec::new()),
        });
        logger.add_shared_sink(sink.clone());
        logger.add_processor(Arc::new(|record| {
            record.insert_extra("request_id", json!("req-9"));
            Ok(())
        }));

        logger.info("tagged", vec![]).unwrap();
        assert_eq!(sink.seen.lock().clone(), [Some(json!("req-9"))]);
    }

    #[test]
    fn test_set_level_name_unknown_clears() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        logger.set_level_name("error");
        assert_eq!(logger.level(), Some(Level::ERROR));
        logger.set_level_name("nonsense");
        assert_eq!(logger.level(), None);
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        struct FailingSink;
        impl Sink for FailingSink {
            fn handle(&self, _record: &Record) -> std::io::Result<()> {
                Err(std::io::Error::other("sink exploded"))
            }
        }

        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let good = Arc::new(CollectingSink::default());
        logger.add_sink(FailingSink);
        logger.add_shared_sink(good.clone());
        let root_sink = Arc::new(CollectingSink::default());
        hierarchy.root().add_shared_sink(root_sink.clone());

        logger.info("delivered anyway", vec![]).unwrap();

        assert_eq!(good.messages(), ["delivered anyway"]);
        assert_eq!(root_sink.messages(), ["delivered anyway"]);
    }

    #[test]
    fn test_message_rendered_once_across_sinks() {
        // Two sinks both render; the second must see the cached string.
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.logger("app").unwrap();
        let first = Arc::new(CollectingSink::default());
        let second = Arc::new(CollectingSink::default());
        logger.add_shared_sink(first.clone());
        logger.add_shared_sink(second.clone());

        logger.info("value {}", vec![json!(7)]).unwrap();

        assert_eq!(first.messages(), ["value 7"]);
        assert_eq!(second.messages(), ["value 7"]);
    }
}
