use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Clone, Debug, Parser)]
#[command(name = "hsfd", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "HSFD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Resource to download (https only)
    #[arg(long)]
    pub url: Option<String>,

    /// PEM file with the certificates the server must chain to
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Storage root the destination lives under
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Destination file name under the storage root
    #[arg(short, long)]
    pub output: Option<String>,

    /// Seconds to wait for the link before giving up
    #[arg(long)]
    pub link_timeout: Option<u64>,

    /// Transfer buffer size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the file configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ref url) = self.url {
            config.download.url = url.clone();
        }
        if let Some(ref cert) = self.cert {
            config.download.cert_path = cert.clone();
        }
        if let Some(ref storage) = self.storage {
            config.storage.base_path = storage.clone();
        }
        if let Some(ref output) = self.output {
            config.storage.file_name = output.clone();
        }
        if let Some(secs) = self.link_timeout {
            config.network.link_timeout_secs = secs;
        }
        if let Some(size) = self.chunk_size {
            config.download.chunk_size = size;
        }
        config
    }
}
