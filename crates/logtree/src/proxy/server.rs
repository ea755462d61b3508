//! Aggregator-side proxy server
//!
//! Accepts connections from worker processes and funnels their records
//! into the local [`Hierarchy`]. Each connection gets its own task and its
//! own framing buffer; records within a connection are reconstructed and
//! dispatched in arrival order, while connections interleave freely —
//! there is no global order across clients.
//!
//! Reconstructed records are *not* re-gated against logger levels: they
//! already passed the gate in the originating process. Only the server's
//! per-sink level filters apply during dispatch.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, warn};

use crate::error::LogResult;
use crate::hierarchy::Hierarchy;
use crate::proxy::{default_endpoint_path, wire::WireRecord, PROXY_ENV};

/// Server end of the log proxy.
///
/// Dropping (or [`ProxyServer::close`]) stops accepting and best-effort
/// removes the socket file.
pub struct ProxyServer {
    path: PathBuf,
    accept_task: JoinHandle<()>,
    cleaned_up: bool,
}

impl ProxyServer {
    /// Bind a proxy endpoint and start accepting connections.
    ///
    /// With no explicit `path`, the per-process default
    /// (`<tmp>/logtree-<pid>.sock`) is used. A stale socket file at the
    /// path is removed first; the chosen path is then published in
    /// `LOGTREE_PROXY` so that forked workers can discover it.
    ///
    /// # Errors
    ///
    /// `LogError::Io` when removing a stale file fails for any reason
    /// other than it not existing, or when binding the socket fails.
    pub async fn bind(path: Option<PathBuf>, hierarchy: Hierarchy) -> LogResult<Self> {
        let path = path.unwrap_or_else(default_endpoint_path);

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(?path, "removed stale proxy endpoint"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let listener = UnixListener::bind(&path)?;
        std::env::set_var(PROXY_ENV, &path);
        debug!(?path, "proxy endpoint bound");

        let accept_task = tokio::spawn(accept_loop(listener, hierarchy));

        Ok(Self {
            path,
            accept_task,
            cleaned_up: false,
        })
    }

    /// Endpoint path this server is listening on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop accepting and remove the endpoint file.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.accept_task.abort();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(?err, path = ?self.path, "failed to remove proxy endpoint"),
        }
    }
}

impl Drop for ProxyServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(listener: UnixListener, hierarchy: Hierarchy) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                tokio::spawn(handle_connection(stream, hierarchy.clone()));
            }
            Err(err) => {
                warn!(%err, "proxy accept failed");
            }
        }
    }
}

/// Drain one client connection: deframe lines, reconstruct records,
/// dispatch each through the local hierarchy.
///
/// A malformed line is dropped with a warning; the connection stays up.
async fn handle_connection(stream: UnixStream, hierarchy: Hierarchy) {
    let mut lines = FramedRead::new(stream, LinesCodec::new());
    while let Some(next) = lines.next().await {
        match next {
            Ok(line) => {
                if let Err(err) = reinject(&hierarchy, &line) {
                    warn!(%err, "dropping malformed proxy record");
                }
            }
            Err(err) => {
                warn!(%err, "proxy connection read failed");
                break;
            }
        }
    }
    debug!("proxy connection closed");
}

/// Rebuild the record and dispatch it exactly as a local log call would,
/// creating the named logger on demand.
fn reinject(hierarchy: &Hierarchy, line: &str) -> LogResult<()> {
    let wire = WireRecord::from_line(line)?;
    let logger = hierarchy.logger(&wire.name)?;
    let record = wire.into_record()?;
    logger.dispatch(&record);
    Ok(())
}
