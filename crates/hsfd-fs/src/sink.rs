use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Destination for transferred bytes.
///
/// `write` reports how many bytes were accepted. A count short of
/// `buf.len()` means the destination truncated the write; callers treat that
/// as fatal.
pub trait OutputSink: Send {
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Flush buffered bytes and release the destination.
    fn close(self) -> impl Future<Output = io::Result<()>> + Send;
}

/// Creates sinks in create-or-truncate, write-only mode.
pub trait SinkOpener: Send + Sync {
    type Sink: OutputSink;

    fn create(&self, path: &Path) -> impl Future<Output = io::Result<Self::Sink>> + Send;
}

/// Opens [`FileSink`]s with a fixed write buffer.
#[derive(Clone, Copy, Debug)]
pub struct FileSinkOpener {
    buffer_capacity: usize,
}

impl Default for FileSinkOpener {
    fn default() -> Self { Self::new(16 * 1024) }
}

impl FileSinkOpener {
    pub fn new(buffer_capacity: usize) -> Self { Self { buffer_capacity } }

    pub fn buffer_capacity(&self) -> usize { self.buffer_capacity }
}

impl SinkOpener for FileSinkOpener {
    type Sink = FileSink;

    async fn create(&self, path: &Path) -> io::Result<FileSink> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;
        Ok(FileSink {
            path: path.to_path_buf(),
            inner: BufWriter::with_capacity(self.buffer_capacity, file),
            bytes_written: 0,
        })
    }
}

/// Buffered file destination.
#[derive(Debug)]
pub struct FileSink {
    path:          PathBuf,
    inner:         BufWriter<File>,
    bytes_written: u64,
}

impl FileSink {
    pub fn path(&self) -> &Path { &self.path }

    pub fn bytes_written(&self) -> u64 { self.bytes_written }
}

impl OutputSink for FileSink {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.inner.write(&buf[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, written, path = %self.path.display(), "write cut short");
                    break;
                }
            }
        }
        self.bytes_written += written as u64;
        Ok(written)
    }

    async fn close(mut self) -> io::Result<()> {
        self.inner.flush().await?;
        self.inner.get_mut().sync_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_and_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut sink = FileSinkOpener::new(8).create(&path).await.unwrap();
        assert_eq!(sink.write(b"hello ").await.unwrap(), 6);
        assert_eq!(sink.write(b"world").await.unwrap(), 5);
        assert_eq!(sink.bytes_written(), 11);
        sink.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, vec![7u8; 4096]).unwrap();

        let mut sink = FileSinkOpener::default().create(&path).await.unwrap();
        sink.write(b"new").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_create_fails_in_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");

        let err = FileSinkOpener::default().create(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_writes_larger_than_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

        let mut sink = FileSinkOpener::new(1024).create(&path).await.unwrap();
        assert_eq!(sink.write(&data).await.unwrap(), data.len());
        sink.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), data);
    }
}
