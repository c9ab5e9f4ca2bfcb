//! referral-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! database, and serves the referral API over HTTP.
//!
//! Every setting can be overridden with a `REFERRAL_`-prefixed environment
//! variable, e.g. `REFERRAL_PORT=9000`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use referral_core::ReferralService;
use referral_server::{ServerConfig, shutdown_signal};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Referral tracking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(config::File::from(cli.config).required(false))?;

  let db = server_cfg.open_database().await?;
  tracing::info!(path = %db.path().display(), "database ready");

  let service = Arc::new(ReferralService::new(db));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, referral_api::api_router(service))
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}
