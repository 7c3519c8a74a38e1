use std::fmt;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::latch::ReadinessLatch;

/// Network name and secret for link association.
///
/// The secret is never printed; `Debug` redacts it.
#[derive(Clone, Default)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the connectivity unit decides the link is up.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// `host:port` that must accept a TCP connection.
    pub target: String,
    /// Pause between failed probes.
    pub interval: Duration,
    /// Give up after this long; the latch then stays unset.
    pub deadline: Duration,
}

impl ProbeOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            interval: Duration::from_millis(500),
            deadline: Duration::from_secs(20),
        }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Connectivity collaborator: brings the link up and sets the latch.
///
/// On a host build "address acquired" means the resource host resolved and
/// accepted a TCP connection, which is the point where a device would have
/// received its DHCP lease.
pub struct Connectivity {
    latch: ReadinessLatch,
    credentials: Credentials,
    options: ProbeOptions,
}

impl Connectivity {
    pub fn new(latch: ReadinessLatch, credentials: Credentials, options: ProbeOptions) -> Self {
        Self {
            latch,
            credentials,
            options,
        }
    }

    /// Run [`establish`](Self::establish) on its own task.
    pub fn spawn(self) -> JoinHandle<bool> { tokio::spawn(async move { self.establish().await }) }

    /// Probe until the link is up or the deadline passes.
    ///
    /// Returns whether the latch was set.
    pub async fn establish(&self) -> bool {
        self.latch.reset();
        info!(
            ssid = %self.credentials.ssid,
            target = %self.options.target,
            "connecting"
        );

        let deadline = Instant::now() + self.options.deadline;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match tokio::time::timeout_at(deadline, TcpStream::connect(&self.options.target)).await
            {
                Ok(Ok(stream)) => {
                    match stream.local_addr() {
                        Ok(addr) => info!(address = %addr.ip(), attempts, "got address, link up"),
                        Err(_) => info!(attempts, "link up"),
                    }
                    self.latch.set();
                    return true;
                }
                Ok(Err(e)) => debug!(error = %e, attempts, "link probe failed"),
                Err(_) => break,
            }

            if Instant::now() + self.options.interval >= deadline {
                break;
            }
            tokio::time::sleep(self.options.interval).await;
        }

        warn!(
            attempts,
            deadline_ms = self.options.deadline.as_millis() as u64,
            "failed to bring link up within deadline"
        );
        false
    }
}
