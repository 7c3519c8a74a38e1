use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod cli;
mod config;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = cli.apply(Config::load(cli.config.as_deref())?);
    let plan = app::Plan::prepare(&config)?;

    match app::run(plan).await? {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(failure) => {
            error!(
                phase = %failure.phase,
                bytes = ?failure.bytes_transferred,
                "{failure}"
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
