use std::error::Error as StdError;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Certificate, Client, Response};
use tracing::debug;

use super::body::{BodyReader, FrameSource};
use super::{Chunk, NetError, StreamClient, StreamSession, TrustAnchor};

/// Terminal status of a [`ReqwestSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Ended,
    Errored,
}

/// Production streaming client on `reqwest`.
///
/// Each `open` builds a client that trusts only the supplied anchor and
/// verifies the server host name.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    timeout:    Duration,
    keep_alive: bool,
}

impl Default for ReqwestClient {
    fn default() -> Self { Self::new() }
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            timeout:    Duration::from_secs(20),
            keep_alive: true,
        }
    }

    /// Bound for connection setup and for each body read.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    fn build(&self, anchor: &TrustAnchor) -> Result<Client, NetError> {
        let roots = Certificate::from_pem_bundle(anchor.as_pem())
            .map_err(|e| NetError::Connect(format!("invalid trust anchor: {}", describe(&e))))?;

        let mut builder = Client::builder()
            .https_only(true)
            .tls_built_in_root_certs(false)
            .connect_timeout(self.timeout)
            .read_timeout(self.timeout);
        for root in roots {
            builder = builder.add_root_certificate(root);
        }
        if self.keep_alive {
            builder = builder.tcp_keepalive(Some(self.timeout));
        } else {
            builder = builder.pool_max_idle_per_host(0);
        }

        builder
            .build()
            .map_err(|e| NetError::Connect(describe(&e)))
    }
}

impl StreamClient for ReqwestClient {
    type Session = ReqwestSession;

    async fn open(&self, url: &str, anchor: &TrustAnchor) -> Result<ReqwestSession, NetError> {
        let client = self.build(anchor)?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| NetError::Connect(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Protocol(status.as_u16()));
        }

        debug!(%url, status = status.as_u16(), "response headers received");
        Ok(ReqwestSession {
            content_length: response.content_length(),
            body: BodyReader::new(response),
            position: 0,
            status: SessionStatus::Open,
        })
    }
}

impl FrameSource for Response {
    type Error = reqwest::Error;

    async fn next_frame(&mut self) -> Result<Option<Bytes>, reqwest::Error> { self.chunk().await }
}

/// One HTTPS response body, read in caller-sized pieces.
///
/// At most one body frame is held between calls.
#[derive(Debug)]
pub struct ReqwestSession {
    body:           BodyReader<Response>,
    content_length: Option<u64>,
    position:       u64,
    status:         SessionStatus,
}

impl ReqwestSession {
    /// Bytes handed to the caller so far.
    pub fn position(&self) -> u64 { self.position }

    pub fn status(&self) -> SessionStatus { self.status }
}

impl StreamSession for ReqwestSession {
    fn fetch_length(&self) -> Option<u64> { self.content_length }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Chunk, NetError> {
        match self.status {
            SessionStatus::Open => {}
            SessionStatus::Ended => return Ok(Chunk::EndOfStream),
            SessionStatus::Errored => return Err(NetError::Read("session already failed".into())),
        }

        match self.body.read(buf).await {
            Ok(Some(n)) => {
                self.position += n as u64;
                Ok(Chunk::Data(n))
            }
            Ok(None) => {
                self.status = SessionStatus::Ended;
                Ok(Chunk::EndOfStream)
            }
            Err(e) => {
                self.status = SessionStatus::Errored;
                let message = if e.is_timeout() {
                    format!("timed out waiting for data: {}", describe(&e))
                } else {
                    describe(&e)
                };
                Err(NetError::Read(message))
            }
        }
    }

    async fn close(self) {
        debug!(
            position = self.position,
            status = ?self.status,
            "closing session"
        );
        drop(self.body);
    }
}

fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_walks_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::other("inner"));
        assert_eq!(describe(&err), "outer: inner");
    }

    #[tokio::test]
    async fn test_open_rejects_plain_http() {
        let anchor = TrustAnchor::from_pem(
            "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIUQ==\n-----END CERTIFICATE-----\n",
        )
        .unwrap();
        let client = ReqwestClient::new().timeout(Duration::from_millis(200));

        // Either the bogus anchor or https_only stops this before any I/O.
        let err = client
            .open("http://127.0.0.1:9/file.bin", &anchor)
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Connect(_)));
    }
}
