use std::path::Path;

use hsfd_fs::{OutputSink, SinkOpener};
use hsfd_link::{LinkGate, Readiness};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::options::{Progress, TransferOptions};
use super::state::TransferState;
use super::stats::TransferStats;
use crate::error::Error;
use crate::net::{Chunk, NetError, StreamClient, StreamSession, TrustAnchor};

/// A transfer that ended in [`TransferState::Failed`].
#[derive(Debug, thiserror::Error)]
#[error("transfer failed while {phase}: {error}")]
pub struct TransferFailure {
    /// State the failure was detected in.
    pub phase: TransferState,

    /// Bytes fully written before the failure.
    ///
    /// `None` when the failure happened before streaming started.
    pub bytes_transferred: Option<u64>,

    #[source]
    pub error: Error,
}

/// Drives one connectivity-gated transfer from a [`StreamClient`] into a sink.
pub struct Pipeline<C, O> {
    client: C,
    opener: O,
}

impl<C, O> Pipeline<C, O>
where
    C: StreamClient,
    O: SinkOpener,
{
    pub fn new(client: C, opener: O) -> Self { Self { client, opener } }

    /// Run the transfer to a terminal state.
    ///
    /// This is a single attempt: every failure is reported, none is retried.
    pub async fn run<G: LinkGate>(
        &self,
        gate: &G,
        anchor: &TrustAnchor,
        options: &TransferOptions,
    ) -> Result<TransferStats, TransferFailure> {
        let mut machine = Machine::new(options);
        machine.advance(TransferState::AwaitingLink);

        info!(timeout_ms = options.link_timeout.as_millis() as u64, "waiting for link");
        match gate.await_ready(options.link_timeout).await {
            Readiness::Ready => info!("link ready"),
            Readiness::TimedOut => {
                error!(
                    timeout_ms = options.link_timeout.as_millis() as u64,
                    "link not ready within timeout, no transfer attempted"
                );
                return Err(machine.fail(
                    Error::LinkTimeout {
                        waited: options.link_timeout,
                    },
                    None,
                ));
            }
        }

        machine.advance(TransferState::Connecting);
        info!(url = %options.resource, "opening secure session");

        let mut session = match self.client.open(options.url(), anchor).await {
            Ok(session) => session,
            Err(e) => {
                let err = match e {
                    NetError::Protocol(status) => Error::Protocol {
                        url: options.url().to_string(),
                        status,
                    },
                    NetError::Connect(message) | NetError::Read(message) => Error::Connect {
                        url: options.url().to_string(),
                        message,
                    },
                };
                error!(error = %err, "failed to open session");
                return Err(machine.fail(err, None));
            }
        };

        let mut sink = match self.opener.create(options.destination()).await {
            Ok(sink) => sink,
            Err(source) => {
                let err = Error::SinkOpen {
                    path: options.destination().to_path_buf(),
                    source,
                };
                error!(error = %err, "failed to open output");
                session.close().await;
                return Err(machine.fail(err, None));
            }
        };

        let declared = session.fetch_length();
        machine.content_length = declared;
        match declared {
            Some(length) => info!(content_length = length, "declared content length"),
            None => debug!("no content length declared"),
        }

        let mut buffer = vec![0u8; options.chunk_size.get()];
        machine.advance(TransferState::Streaming);
        let started = Instant::now();

        let mut total = 0u64;
        let pumped = pump(
            &mut session,
            &mut sink,
            &mut buffer,
            options.destination(),
            &mut total,
            &machine,
        )
        .await;

        if let Err(err) = pumped {
            if let Err(e) = sink.close().await {
                warn!(error = %e, "failed to close output after error");
            }
            session.close().await;
            error!(error = %err, bytes = total, "transfer failed");
            return Err(machine.fail(err, Some(total)));
        }

        info!("download complete");
        let flushed = sink.close().await;
        session.close().await;
        if let Err(source) = flushed {
            let err = Error::SinkFlush {
                path: options.destination().to_path_buf(),
                source,
            };
            error!(error = %err, bytes = total, "transfer failed");
            return Err(machine.fail(err, Some(total)));
        }

        let stats = TransferStats {
            started,
            finished: Instant::now(),
            total_bytes: total,
        };
        if let Some(length) = declared
            && length != total
        {
            debug!(declared = length, received = total, "stream length differs from declared");
        }

        machine.bytes = total;
        machine.advance(TransferState::Completed);
        let kbps = format!("{:.2}", stats.throughput_kbps());
        info!(
            bytes = stats.total_bytes,
            elapsed_ms = stats.elapsed().as_millis() as u64,
            kbps = %kbps,
            target_kbps = ?options.target_kbps,
            "transfer finished"
        );
        Ok(stats)
    }
}

/// Move chunks until end of stream or the first error.
///
/// `total` counts bytes fully written and stays valid on error.
async fn pump<S, K>(
    session: &mut S,
    sink: &mut K,
    buffer: &mut [u8],
    path: &Path,
    total: &mut u64,
    machine: &Machine<'_>,
) -> Result<(), Error>
where
    S: StreamSession,
    K: OutputSink,
{
    loop {
        let n = match session.read_chunk(buffer).await {
            Ok(Chunk::EndOfStream) => return Ok(()),
            Ok(Chunk::Data(0)) => {
                return Err(Error::Read {
                    bytes: *total,
                    message: "zero-length read without end of stream".to_string(),
                });
            }
            Ok(Chunk::Data(n)) if n > buffer.len() => {
                return Err(Error::Read {
                    bytes: *total,
                    message: format!("read of {n} bytes overran a {} byte buffer", buffer.len()),
                });
            }
            Ok(Chunk::Data(n)) => n,
            Err(e) => {
                return Err(Error::Read {
                    bytes: *total,
                    message: e.to_string(),
                });
            }
        };

        match sink.write(&buffer[..n]).await {
            Ok(written) if written == n => {}
            Ok(written) => {
                return Err(Error::SinkWrite {
                    path: path.to_path_buf(),
                    written,
                    requested: n,
                    source: None,
                });
            }
            Err(source) => {
                return Err(Error::SinkWrite {
                    path: path.to_path_buf(),
                    written: 0,
                    requested: n,
                    source: Some(source),
                });
            }
        }

        *total += n as u64;
        machine.report(*total);
    }
}

/// Guarded state holder that mirrors transitions to the progress callback.
struct Machine<'a> {
    state: TransferState,
    bytes: u64,
    content_length: Option<u64>,
    options: &'a TransferOptions,
}

impl<'a> Machine<'a> {
    fn new(options: &'a TransferOptions) -> Self {
        Self {
            state: TransferState::Idle,
            bytes: 0,
            content_length: None,
            options,
        }
    }

    fn advance(&mut self, next: TransferState) {
        let Ok(state) = self.state.advance(next) else {
            unreachable!("illegal transition {} -> {}", self.state, next);
        };
        debug!(from = %self.state, to = %state, "state change");
        self.state = state;
        self.report(self.bytes);
    }

    fn fail(&mut self, error: Error, bytes_transferred: Option<u64>) -> TransferFailure {
        let phase = self.state;
        if let Some(bytes) = bytes_transferred {
            self.bytes = bytes;
        }
        self.advance(TransferState::Failed);
        TransferFailure {
            phase,
            bytes_transferred,
            error,
        }
    }

    fn report(&self, bytes_transferred: u64) {
        if let Some(ref callback) = self.options.on_progress {
            callback(&Progress {
                state: self.state,
                bytes_transferred,
                content_length: self.content_length,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TransferOptions {
        TransferOptions::new("https://example.com/f.bin", "/spiffs/f.bin").unwrap()
    }

    #[test]
    fn test_machine_follows_legal_edges() {
        let options = options();
        let mut machine = Machine::new(&options);
        machine.advance(TransferState::AwaitingLink);
        machine.advance(TransferState::Connecting);
        let failure = machine.fail(
            Error::Connect {
                url: options.url().to_string(),
                message: "refused".to_string(),
            },
            None,
        );

        assert_eq!(failure.phase, TransferState::Connecting);
        assert_eq!(machine.state, TransferState::Failed);
    }

    #[test]
    #[should_panic(expected = "illegal transition Idle -> Streaming")]
    fn test_machine_rejects_skipping_the_gate() {
        let options = options();
        Machine::new(&options).advance(TransferState::Streaming);
    }

    #[test]
    #[should_panic(expected = "illegal transition Completed -> Failed")]
    fn test_machine_rejects_leaving_a_terminal_state() {
        let options = options();
        let mut machine = Machine::new(&options);
        for state in [
            TransferState::AwaitingLink,
            TransferState::Connecting,
            TransferState::Streaming,
            TransferState::Completed,
        ] {
            machine.advance(state);
        }
        machine.advance(TransferState::Failed);
    }
}
