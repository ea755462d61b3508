//! Cross-process log proxy
//!
//! Enables logging to resources that can only have a single handle open,
//! such as files or a terminal, from multiple OS processes: worker
//! processes attach a [`ProxyClient`] to their hierarchy and every accepted
//! record is also shipped, fully rendered, over a local Unix-domain socket
//! to the one process running a [`ProxyServer`], which re-injects each
//! record into its own hierarchy as if it had been logged locally.
//!
//! ## Wire format
//!
//! One UTF-8 JSON object per line, `\n` terminated, self-describing
//! (name, numeric level, epoch-millis timestamp, rendered message, plus
//! any processor-attached attributes). JSON string escaping guarantees no
//! raw newline ever appears inside a field, so the framing never splits a
//! record.
//!
//! ## Endpoint discovery
//!
//! The server publishes its socket path in the `LOGTREE_PROXY` environment
//! variable, which forked workers inherit; [`is_available`] checks for it.

pub mod client;
pub mod server;
pub mod wire;

pub use client::ProxyClient;
pub use server::ProxyServer;
pub use wire::WireRecord;

use std::path::PathBuf;

/// Environment variable naming the active proxy endpoint path.
pub const PROXY_ENV: &str = "LOGTREE_PROXY";

/// Whether a proxy endpoint is published in this process's environment.
pub fn is_available() -> bool {
    std::env::var_os(PROXY_ENV).is_some()
}

/// Endpoint path used when none is supplied, derived from the server's
/// process id.
pub fn default_endpoint_path() -> PathBuf {
    std::env::temp_dir().join(format!("logtree-{}.sock", std::process::id()))
}
