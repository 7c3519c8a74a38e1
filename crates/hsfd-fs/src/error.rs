use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage root {} does not exist", .path.display())]
    NotMounted { path: PathBuf },

    #[error("storage root {} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to mount {}: {source}", .path.display())]
    Mount {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name:?} does not name a file under the storage root")]
    InvalidName { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
