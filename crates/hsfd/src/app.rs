use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use hsfd_fetch::{
    Pipeline, ReqwestClient, ResourceId, TransferFailure, TransferOptions, TransferStats,
    TrustAnchor,
};
use hsfd_fs::{FileSinkOpener, MountOptions, StorageRoot, resolve_under};
use hsfd_link::{Connectivity, Credentials, ProbeOptions, ReadinessLatch};
use tracing::{info, warn};

use crate::config::Config;

/// Everything the download task needs, resolved from configuration.
pub struct Plan {
    pub anchor: TrustAnchor,
    pub options: TransferOptions,
    pub client: ReqwestClient,
    pub opener: FileSinkOpener,
    pub probe: ProbeOptions,
    pub credentials: Credentials,
}

impl Plan {
    /// Validate configuration, load the trust anchor and mount storage.
    ///
    /// A failed mount is logged and tolerated; the sink open reports it later.
    pub fn prepare(config: &Config) -> Result<Self> {
        config.validate()?;
        let resource = ResourceId::parse(&config.download.url)?;

        let pem = std::fs::read(&config.download.cert_path).with_context(|| {
            format!("failed to read certificate {}", config.download.cert_path.display())
        })?;
        let anchor = TrustAnchor::from_pem(pem).with_context(|| {
            format!("invalid certificate {}", config.download.cert_path.display())
        })?;

        let destination = destination(config)?;
        let chunk_size = NonZeroUsize::new(config.download.chunk_size)
            .context("download.chunk_size must be non-zero")?;
        let link_timeout = Duration::from_secs(config.network.link_timeout_secs);

        let options = TransferOptions::new(resource.as_str(), destination)?
            .link_timeout(link_timeout)
            .chunk_size(chunk_size)
            .target_kbps(config.download.target_kbps);

        let client = ReqwestClient::new()
            .timeout(Duration::from_secs(config.download.http_timeout_secs))
            .keep_alive(config.download.keep_alive);

        let probe_target = config
            .network
            .probe_addr
            .clone()
            .unwrap_or_else(|| resource.authority());
        let probe = ProbeOptions::new(probe_target)
            .interval(Duration::from_millis(config.network.probe_interval_ms))
            .deadline(link_timeout);

        Ok(Self {
            anchor,
            options,
            client,
            opener: FileSinkOpener::new(config.storage.write_buffer),
            probe,
            credentials: Credentials {
                ssid: config.network.ssid.clone(),
                password: config.network.password.clone(),
            },
        })
    }
}

fn destination(config: &Config) -> Result<PathBuf> {
    let storage = &config.storage;
    let options = MountOptions::new().format_if_mount_failed(storage.format_if_mount_failed);
    let path = match StorageRoot::mount(&storage.base_path, options) {
        Ok(root) => root.resolve(&storage.file_name)?,
        Err(e) => {
            warn!(error = %e, "storage mount failed; continuing");
            resolve_under(&storage.base_path, &storage.file_name)?
        }
    };
    Ok(path)
}

/// Bring the link up on one task and run the transfer on another.
pub async fn run(plan: Plan) -> Result<Result<TransferStats, TransferFailure>> {
    let latch = ReadinessLatch::new();
    let link = Connectivity::new(latch.clone(), plan.credentials, plan.probe).spawn();

    let Plan {
        anchor,
        options,
        client,
        opener,
        ..
    } = plan;
    info!(url = options.url(), destination = %options.destination().display(), "starting download task");

    let worker = tokio::spawn(async move {
        Pipeline::new(client, opener)
            .run(&latch, &anchor, &options)
            .await
    });
    let outcome = worker.await.context("download task panicked")?;

    // still probing only if the transfer gave up on the link first
    link.abort();
    Ok(outcome)
}
