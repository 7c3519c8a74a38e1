use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hsfd_fetch::ResourceId;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub network:  NetworkConfig,
    pub download: DownloadConfig,
    pub storage:  StorageConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub ssid:              String,
    pub password:          String,
    /// `host:port` probed for link-up; defaults to the download host.
    pub probe_addr:        Option<String>,
    pub link_timeout_secs: u64,
    pub probe_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid:              String::new(),
            password:          String::new(),
            probe_addr:        None,
            link_timeout_secs: 20,
            probe_interval_ms: 500,
        }
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("probe_addr", &self.probe_addr)
            .field("link_timeout_secs", &self.link_timeout_secs)
            .field("probe_interval_ms", &self.probe_interval_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub url:               String,
    pub cert_path:         PathBuf,
    pub http_timeout_secs: u64,
    pub chunk_size:        usize,
    pub keep_alive:        bool,
    /// Logged next to the measured throughput, never enforced.
    pub target_kbps:       Option<u32>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            url:               String::new(),
            cert_path:         PathBuf::from("server_cert.pem"),
            http_timeout_secs: 20,
            chunk_size:        16 * 1024,
            keep_alive:        true,
            target_kbps:       Some(400),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub base_path:              PathBuf,
    pub file_name:              String,
    pub write_buffer:           usize,
    pub format_if_mount_failed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path:              PathBuf::from("./spiffs"),
            file_name:              "download_file.bin".to_string(),
            write_buffer:           16 * 1024,
            format_if_mount_failed: true,
        }
    }
}

impl Config {
    /// Read a TOML config file, or fall back to defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> { Ok(toml::from_str(contents)?) }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ResourceId::parse(&self.download.url).context("invalid download.url")?;
        if self.download.chunk_size == 0 {
            bail!("download.chunk_size must be non-zero");
        }
        if self.storage.write_buffer == 0 {
            bail!("storage.write_buffer must be non-zero");
        }
        if self.storage.file_name.is_empty() {
            bail!("storage.file_name must not be empty");
        }
        if self.network.link_timeout_secs == 0 {
            bail!("network.link_timeout_secs must be non-zero");
        }
        Ok(())
    }
}
