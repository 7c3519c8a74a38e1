//! Error types for hsfd-fetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Everything that can end a transfer in the `Failed` state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("link not ready after {} ms", .waited.as_millis())]
    LinkTimeout { waited: Duration },

    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("{url} rejected the request with HTTP {status}")]
    Protocol { url: String, status: u16 },

    #[error("read failed after {bytes} bytes: {message}")]
    Read { bytes: u64, message: String },

    #[error("failed to create {}: {source}", .path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write to {} accepted {written} of {requested} bytes", .path.display())]
    SinkWrite {
        path: PathBuf,
        written: usize,
        requested: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("failed to finalize {}: {source}", .path.display())]
    SinkFlush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejected configuration, reported before any task starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("resource URL is empty")]
    EmptyUrl,

    #[error("unsupported scheme in {0:?}, expected https")]
    UnsupportedScheme(String),

    #[error("malformed resource URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("resource URL {0:?} has no host")]
    MissingHost(String),

    #[error("invalid port in {0:?}")]
    InvalidPort(String),

    #[error("trust anchor contains no PEM certificate")]
    NoCertificate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::LinkTimeout {
            waited: Duration::from_secs(20),
        };
        assert_eq!(err.to_string(), "link not ready after 20000 ms");

        let err = Error::Protocol {
            url: "https://example.com/1MB.bin".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "https://example.com/1MB.bin rejected the request with HTTP 404"
        );

        let err = Error::SinkWrite {
            path: PathBuf::from("/spiffs/download_file.bin"),
            written: 100,
            requested: 4096,
            source: None,
        };
        assert_eq!(
            err.to_string(),
            "write to /spiffs/download_file.bin accepted 100 of 4096 bytes"
        );
    }

    #[test]
    fn test_sink_write_exposes_io_source() {
        use std::error::Error as _;

        let err = Error::SinkWrite {
            path: PathBuf::from("out.bin"),
            written: 0,
            requested: 10,
            source: Some(io::Error::other("device full")),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("device full".to_string()));
    }
}
