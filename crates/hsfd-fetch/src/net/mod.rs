//! Secure streaming client abstraction.
//!
//! A [`StreamClient`] opens one encrypted request and hands back a
//! [`StreamSession`], which the transfer loop drains with
//! [`read_chunk`](StreamSession::read_chunk) and releases with
//! [`close`](StreamSession::close). `close` takes the session by value, so a
//! session cannot be closed twice.
//!
//! # Implementations
//!
//! - [`ReqwestClient`]: production client on `reqwest`, pinned to a
//!   [`TrustAnchor`]
//! - Fakes in the test suites

mod anchor;
#[cfg(any(feature = "reqwest", test))]
mod body;
#[cfg(feature = "reqwest")]
mod http;
mod resource;

use std::future::Future;

pub use anchor::TrustAnchor;
#[cfg(feature = "reqwest")]
pub use http::{ReqwestClient, ReqwestSession, SessionStatus};
pub use resource::ResourceId;

/// Result of one pull from a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// `n` bytes were placed at the front of the caller's buffer.
    ///
    /// Short reads are normal. `Data(0)` is never valid.
    Data(usize),
    /// The response body ended cleanly.
    EndOfStream,
}

/// Failures reported by a client or session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    /// DNS, TCP or TLS establishment failed.
    #[error("{0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Protocol(u16),

    /// Transport fault mid-stream, including a read timeout with no data.
    #[error("{0}")]
    Read(String),
}

/// Opens secured requests against a resource.
pub trait StreamClient: Send + Sync {
    type Session: StreamSession;

    /// Connect, validate the peer against `anchor` and issue the request.
    ///
    /// Resolves once the response headers are in; a non-success status is a
    /// [`NetError::Protocol`].
    fn open(
        &self,
        url: &str,
        anchor: &TrustAnchor,
    ) -> impl Future<Output = Result<Self::Session, NetError>> + Send;
}

/// One open request/response exchange.
pub trait StreamSession: Send {
    /// Content length declared by the response headers, if present.
    ///
    /// Advisory only: it must not size buffers or end the transfer.
    fn fetch_length(&self) -> Option<u64>;

    /// Pull at most `buf.len()` bytes.
    fn read_chunk(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<Chunk, NetError>> + Send;

    /// Release all transport resources.
    fn close(self) -> impl Future<Output = ()> + Send;
}
