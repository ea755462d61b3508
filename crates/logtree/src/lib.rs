//! logtree — hierarchical logging with a cross-process proxy
//!
//! Applications obtain named loggers, emit leveled records, and records fan
//! out to pluggable sinks. Loggers are organized in a dot-separated
//! namespace tree: a level or sink configured on `"app"` applies to
//! `"app.db.pool"` unless something closer overrides it, and loggers may be
//! requested in any order — ancestors materialize on demand.
//!
//! ## Quick start
//!
//! ```
//! use logtree::{ConsoleSink, Hierarchy, Level};
//!
//! # fn main() -> logtree::LogResult<()> {
//! let hierarchy = Hierarchy::new();
//!
//! let app = hierarchy.logger("app")?;
//! app.set_level(Level::DEBUG);
//! app.add_sink(ConsoleSink::new());
//!
//! let db = hierarchy.logger("app.db")?;
//! db.debug("connection pool sized {}", vec![8.into()])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Cross-process logging
//!
//! Single-writer resources (a log file, a terminal) cannot be shared by
//! forked workers. The [`proxy`] module funnels records from many processes
//! into one: the aggregator binds a [`ProxyServer`] on its hierarchy,
//! workers call [`Hierarchy::enable_proxy`] (discovering the endpoint via
//! the `LOGTREE_PROXY` environment variable), and every record a worker
//! accepts is shipped over a Unix-domain socket and re-dispatched by the
//! aggregator as if logged locally.

pub mod error;
pub mod hierarchy;
pub mod level;
pub mod logger;
pub mod proxy;
pub mod record;
pub mod sink;
pub mod sinks;

// Re-exports
pub use error::{LogError, LogResult, ProcessorError};
pub use hierarchy::Hierarchy;
pub use level::Level;
pub use logger::{get_logger, Logger};
pub use proxy::{ProxyClient, ProxyServer, WireRecord};
pub use record::{Processor, Record};
pub use sink::{DefaultFormatter, Formatter, Sink};
pub use sinks::{ConsoleSink, FileSink};

use std::sync::OnceLock;

static DEFAULT_HIERARCHY: OnceLock<Hierarchy> = OnceLock::new();

/// The process-wide hierarchy, created on first use.
///
/// Prefer constructing a [`Hierarchy`] at startup and threading it through
/// the application; this instance exists for the cases where that is
/// impractical.
pub fn default_hierarchy() -> &'static Hierarchy {
    DEFAULT_HIERARCHY.get_or_init(Hierarchy::new)
}

/// Attach a processor to every logger created on the default hierarchy
/// from now on.
pub fn add_default_processor(processor: Processor) {
    default_hierarchy().add_default_processor(processor);
}

/// Attach a proxy client from the environment to the default hierarchy.
pub fn enable_proxy() -> LogResult<()> {
    default_hierarchy().enable_proxy()
}
