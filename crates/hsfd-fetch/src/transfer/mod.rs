//! The chunked transfer loop and its data types.

mod options;
mod pipeline;
mod state;
mod stats;

pub use options::{DEFAULT_CHUNK_SIZE, Progress, ProgressCallback, TransferOptions};
pub use pipeline::{Pipeline, TransferFailure};
pub use state::{IllegalTransition, TransferState};
pub use stats::TransferStats;
