use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::state::TransferState;
use crate::error::ConfigError;
use crate::net::ResourceId;

/// Default transfer buffer size.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(16 * 1024) {
    Some(size) => size,
    None => unreachable!(),
};

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub state: TransferState,

    /// Bytes fully written to the sink so far.
    pub bytes_transferred: u64,

    /// Declared content length, once the response headers are in.
    ///
    /// Advisory; the stream may deliver more or fewer bytes.
    pub content_length: Option<u64>,
}

impl Progress {
    /// Percentage of the declared length, capped at 100.
    ///
    /// Returns `None` if the length is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.content_length.map(|total| {
            if total == 0 {
                if self.state == TransferState::Completed { 100.0 } else { 0.0 }
            } else {
                (self.bytes_transferred as f64 / total as f64 * 100.0).min(100.0)
            }
        })
    }
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Configuration for one pipeline run.
///
/// # Examples
///
/// ```
/// use hsfd_fetch::TransferOptions;
/// use std::time::Duration;
///
/// let options = TransferOptions::new(
///     "https://speed.hetzner.de/1MB.bin",
///     "/spiffs/download_file.bin",
/// )
/// .unwrap()
/// .link_timeout(Duration::from_secs(20))
/// .target_kbps(Some(400));
/// ```
#[derive(Clone)]
pub struct TransferOptions {
    /// Resource to fetch, passed to the client unmodified.
    pub resource: ResourceId,

    /// Destination file, created or truncated.
    pub destination: PathBuf,

    /// Longest wait on the link gate.
    ///
    /// Default: 20s
    pub link_timeout: Duration,

    /// Size of the single transfer buffer.
    ///
    /// Never derived from the declared content length.
    ///
    /// Default: 16 KiB
    pub chunk_size: NonZeroUsize,

    /// Expected throughput in KiB/s, logged next to the measured figure.
    ///
    /// Report-only; nothing is throttled or compared against it.
    pub target_kbps: Option<u32>,

    /// Invoked on every state transition and after every chunk write.
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferOptions")
            .field("resource", &self.resource.as_str())
            .field("destination", &self.destination)
            .field("link_timeout", &self.link_timeout)
            .field("chunk_size", &self.chunk_size)
            .field("target_kbps", &self.target_kbps)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl TransferOptions {
    pub fn new(url: &str, destination: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            resource: ResourceId::parse(url)?,
            destination: destination.into(),
            link_timeout: Duration::from_secs(20),
            chunk_size: DEFAULT_CHUNK_SIZE,
            target_kbps: None,
            on_progress: None,
        })
    }

    pub fn url(&self) -> &str { self.resource.as_str() }

    pub fn destination(&self) -> &Path { &self.destination }

    #[must_use]
    pub fn link_timeout(mut self, timeout: Duration) -> Self {
        self.link_timeout = timeout;
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn target_kbps(mut self, target_kbps: Option<u32>) -> Self {
        self.target_kbps = target_kbps;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
