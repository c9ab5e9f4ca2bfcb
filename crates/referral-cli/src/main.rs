//! `referral` — operator command line for the referral database.
//!
//! # Usage
//!
//! ```
//! referral --database referrals.db register 42 --referrer 7
//! referral status 42
//! referral summary 7
//! ```
//!
//! Every command opens its own unit of work against the SQLite file, so the
//! CLI can run alongside a live server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use referral_core::{ReferralService, RequestId, user::ExternalId};
use referral_store_sqlite::SqliteDatabase;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "referral", version, about = "Manage users and referrals")]
struct Args {
  /// SQLite database file; created if missing.
  #[arg(long, env = "REFERRAL_DATABASE", default_value = "referrals.db", global = true)]
  database: PathBuf,

  #[command(subcommand)]
  command: Command,
}

// Ids are accepted as typed, negatives included, so the service reports the
// validation error rather than clap rejecting an unknown flag.
#[derive(Subcommand, Debug)]
enum Command {
  /// Create the user if it does not exist yet.
  Upsert {
    #[arg(allow_negative_numbers = true)]
    external_id: ExternalId,
  },

  /// Record a referral without creating user records.
  Refer {
    #[arg(allow_negative_numbers = true)]
    referrer: ExternalId,
    #[arg(allow_negative_numbers = true)]
    referred: ExternalId,
  },

  /// Register a user, optionally with the user who referred them.
  Register {
    #[arg(allow_negative_numbers = true)]
    external_id: ExternalId,
    #[arg(long, allow_negative_numbers = true)]
    referrer:    Option<ExternalId>,
  },

  /// Show who referred a user and how many users they referred.
  Status {
    #[arg(allow_negative_numbers = true)]
    external_id: ExternalId,
  },

  /// Show a referrer's total and most recent referrals.
  Summary {
    #[arg(allow_negative_numbers = true)]
    referrer: ExternalId,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let db = SqliteDatabase::open(&args.database)
    .await
    .with_context(|| format!("opening database {}", args.database.display()))?;
  let service = ReferralService::new(db);
  let ctx = RequestId::generate();

  match args.command {
    Command::Upsert { external_id } => print(&service.upsert_user(&ctx, external_id).await?),
    Command::Refer { referrer, referred } => {
      print(&service.create_referral(&ctx, referrer, referred).await?)
    }
    Command::Register { external_id, referrer } => {
      match service.register_user(&ctx, external_id, referrer).await? {
        Some(outcome) => print(&outcome),
        None => print(&service.get_user_status(&ctx, external_id).await?),
      }
    }
    Command::Status { external_id } => {
      print(&service.get_user_status(&ctx, external_id).await?)
    }
    Command::Summary { referrer } => {
      print(&service.get_referral_summary(&ctx, referrer).await?)
    }
  }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value).context("serialising output")?;
  println!("{json}");
  Ok(())
}
