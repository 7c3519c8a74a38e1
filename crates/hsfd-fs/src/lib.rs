//! Storage side of the download pipeline.
//!
//! - [`StorageRoot`] validates (or creates) the mounted root and resolves the
//!   destination path under it.
//! - [`OutputSink`] / [`SinkOpener`] are the seams the transfer loop writes
//!   through; [`FileSink`] is the buffered, truncate-on-open implementation.

mod error;
mod mount;
mod sink;

pub use error::{Error, Result};
pub use mount::{MountOptions, StorageInfo, StorageRoot, resolve_under};
pub use sink::{FileSink, FileSinkOpener, OutputSink, SinkOpener};
