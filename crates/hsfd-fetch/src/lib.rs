//! Connectivity-gated HTTPS streaming into storage.
//!
//! # Architecture
//!
//! - [`net`] - the secure streaming client: pull-based, bounded reads over one
//!   request, pinned to a caller-supplied trust anchor
//! - [`transfer`] - the chunked transfer loop: waits on the link gate, then
//!   moves one fixed-size buffer at a time from the session to the sink
//!
//! # Key Properties
//!
//! - **Bounded memory**: one buffer, allocated once, sized by configuration and
//!   never by the declared content length
//! - **Single attempt**: any failure ends the transfer; retry policy belongs to
//!   the caller
//! - **Exact release**: session and sink are closed exactly once on every path

mod error;
pub mod net;
pub mod transfer;

pub use error::{ConfigError, Error, Result};
pub use net::{Chunk, NetError, ResourceId, StreamClient, StreamSession, TrustAnchor};
pub use transfer::{
    IllegalTransition, Pipeline, Progress, TransferFailure, TransferOptions, TransferState,
    TransferStats,
};

#[cfg(feature = "reqwest")]
pub use net::{ReqwestClient, ReqwestSession, SessionStatus};
