use std::future::Future;

use bytes::Bytes;

/// Yields response body frames of whatever size the transport produced.
pub(crate) trait FrameSource: Send {
    type Error;

    /// `Ok(None)` once the body has ended.
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send;
}

/// Re-slices body frames into caller-sized reads.
///
/// At most one frame is held between calls, and its remainder is handed out
/// before the next frame is pulled.
#[derive(Debug)]
pub(crate) struct BodyReader<S> {
    source:  S,
    pending: Bytes,
}

impl<S: FrameSource> BodyReader<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            pending: Bytes::new(),
        }
    }

    /// Copy at most `buf.len()` bytes to the front of `buf`.
    ///
    /// Returns `Ok(None)` at end of body, never while bytes are pending.
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, S::Error> {
        // empty frames carry nothing; keep pulling
        while self.pending.is_empty() {
            match self.source.next_frame().await? {
                Some(frame) => self.pending = frame,
                None => return Ok(None),
            }
        }

        let n = buf.len().min(self.pending.len());
        let head = self.pending.split_to(n);
        buf[..n].copy_from_slice(&head);
        Ok(Some(n))
    }
}
