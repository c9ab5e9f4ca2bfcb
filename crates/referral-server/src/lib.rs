//! HTTP server wiring for the referral service.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite
//! database, and serves [`referral_api::api_router`] until interrupted.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use referral_store_sqlite::SqliteDatabase;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REFERRAL_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub database_path:   PathBuf,
  /// Milliseconds a unit of work waits for the SQLite write lock.
  pub busy_timeout_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            8080,
      database_path:   PathBuf::from("referrals.db"),
      busy_timeout_ms: 5_000,
    }
  }
}

impl ServerConfig {
  /// Layer `source` (usually the TOML file) under `REFERRAL_*` variables.
  pub fn load<S>(source: S) -> anyhow::Result<Self>
  where
    S: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(source)
      .add_source(config::Environment::with_prefix("REFERRAL"))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Open the configured database, creating the schema if needed.
  pub async fn open_database(&self) -> anyhow::Result<SqliteDatabase> {
    let db = SqliteDatabase::open(&self.database_path)
      .await
      .with_context(|| format!("failed to open database at {:?}", self.database_path))?;
    Ok(db.with_busy_timeout(Duration::from_millis(self.busy_timeout_ms)))
  }
}

// ─── Shutdown ─────────────────────────────────────────────────────────────────

/// Resolves on Ctrl-C so in-flight requests can drain.
pub async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %err, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

#[cfg(test)]
mod tests;
