use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Outcome of waiting on the link gate.
///
/// A timeout is a normal outcome, not an error: the caller branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The latch was set before the timeout elapsed.
    Ready,
    /// The timeout elapsed with the latch still unset.
    TimedOut,
}

impl Readiness {
    #[must_use]
    pub fn is_ready(self) -> bool { self == Readiness::Ready }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::Ready => write!(f, "ready"),
            Readiness::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Blocking-wait side of the readiness signal.
///
/// Implementations must return [`Readiness::Ready`] immediately when the
/// signal is already set and must never wait past `timeout`.
pub trait LinkGate: Send + Sync {
    fn await_ready(&self, timeout: Duration) -> impl Future<Output = Readiness> + Send;
}

/// Single-bit, set-once latch signalling that the network link is usable.
///
/// Cloning yields another handle to the same latch. The latch stays set until
/// [`reset`](ReadinessLatch::reset) marks the start of a new connection
/// attempt.
#[derive(Debug, Clone)]
pub struct ReadinessLatch {
    state: Arc<watch::Sender<bool>>,
}

impl Default for ReadinessLatch {
    fn default() -> Self { Self::new() }
}

impl ReadinessLatch {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Mark the link as ready, waking every waiter.
    pub fn set(&self) {
        let was_set = self.state.send_replace(true);
        if !was_set {
            tracing::debug!("readiness latch set");
        }
    }

    /// Clear the latch at the start of a new connection attempt.
    pub fn reset(&self) { self.state.send_replace(false); }

    pub fn is_set(&self) -> bool { *self.state.borrow() }
}

impl LinkGate for ReadinessLatch {
    async fn await_ready(&self, timeout: Duration) -> Readiness {
        let mut rx = self.state.subscribe();
        // The sender lives inside `self`, so the channel cannot close while
        // this future is alive.
        let wait = async move { rx.wait_for(|set| *set).await.is_ok() };
        match tokio::time::timeout(timeout, wait).await {
            Ok(true) => Readiness::Ready,
            Ok(false) | Err(_) => Readiness::TimedOut,
        }
    }
}
