//! Network link readiness for the download pipeline.
//!
//! The connectivity unit and the transfer unit share exactly one object, the
//! [`ReadinessLatch`]. The connectivity side sets it once an address has been
//! acquired; the transfer side blocks on [`LinkGate::await_ready`] with a
//! bounded timeout and never polls.

mod connectivity;
mod latch;

pub use connectivity::{Connectivity, Credentials, ProbeOptions};
pub use latch::{LinkGate, Readiness, ReadinessLatch};
