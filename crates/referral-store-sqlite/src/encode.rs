//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings with microsecond precision, so
//! lexical order in SQL matches chronological order. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use referral_core::{referral::Referral, user::User};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:     String,
  pub external_id: i64,
  pub created_at:  String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, external_id, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:     row.get(0)?,
      external_id: row.get(1)?,
      created_at:  row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:     decode_uuid(&self.user_id)?,
      external_id: self.external_id,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `referrals` row.
pub struct RawReferral {
  pub referral_id:          String,
  pub referrer_external_id: i64,
  pub referred_external_id: i64,
  pub created_at:           String,
}

impl RawReferral {
  pub const COLUMNS: &'static str =
    "referral_id, referrer_external_id, referred_external_id, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      referral_id:          row.get(0)?,
      referrer_external_id: row.get(1)?,
      referred_external_id: row.get(2)?,
      created_at:           row.get(3)?,
    })
  }

  pub fn into_referral(self) -> Result<Referral> {
    Ok(Referral {
      referral_id:          decode_uuid(&self.referral_id)?,
      referrer_external_id: self.referrer_external_id,
      referred_external_id: self.referred_external_id,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}
