//! Worker-side proxy client
//!
//! Holds one persistent connection to the aggregating process and writes
//! one line per record. The logging call path is synchronous, so writes
//! are blocking; transport backpressure is the only flow control, and
//! there is no retry, reconnect, or acknowledgement — a write failure is
//! fatal to that send only.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{LogError, LogResult};
use crate::record::Record;
use crate::proxy::{wire::WireRecord, PROXY_ENV};

/// Client end of the log proxy.
pub struct ProxyClient {
    path: PathBuf,
    stream: Mutex<UnixStream>,
}

impl ProxyClient {
    /// Connect to the server listening at `path`.
    pub fn connect(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&path)?;
        Ok(Self {
            path,
            stream: Mutex::new(stream),
        })
    }

    /// Connect to the endpoint published in `LOGTREE_PROXY`.
    ///
    /// # Errors
    ///
    /// `LogError::ProxyUnavailable` when the variable is absent.
    pub fn from_env() -> LogResult<Self> {
        match std::env::var_os(PROXY_ENV) {
            Some(path) => Self::connect(PathBuf::from(path)),
            None => Err(LogError::ProxyUnavailable),
        }
    }

    /// Endpoint path this client is connected to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ship one record.
    ///
    /// The message is force-rendered first — the receiving process must
    /// get a final string, since the argument values do not cross the
    /// wire — then written as one `\n`-terminated line.
    pub fn send(&self, record: &Record) -> LogResult<()> {
        record.message();
        let mut line = WireRecord::from_record(record).to_line()?;
        line.push('\n');

        let mut stream = self.stream.lock();
        stream.write_all(line.as_bytes())?;
        Ok(())
    }
}
