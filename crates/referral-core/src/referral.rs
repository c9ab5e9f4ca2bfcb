//! Referral edges and their read models.
//!
//! A referral links a referrer to a referred user. Each referred user has at
//! most one referrer, ever; once written a referral is never updated or
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::ExternalId;

/// How many recent referrals a [`ReferralSummary`] carries.
pub const SUMMARY_LIMIT: usize = 5;

/// An immutable referrer → referred edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
  pub referral_id:          Uuid,
  pub referrer_external_id: ExternalId,
  pub referred_external_id: ExternalId,
  /// Server-assigned; never changes after creation.
  pub created_at:           DateTime<Utc>,
}

/// Result of a create-referral call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralOutcome {
  pub referral: Referral,
  /// `false` when the same referral already existed (idempotent replay).
  pub created:  bool,
}

/// One line of a [`ReferralSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEntry {
  pub referred_external_id: ExternalId,
  pub created_at:           DateTime<Utc>,
}

impl From<Referral> for ReferralEntry {
  fn from(r: Referral) -> Self {
    Self {
      referred_external_id: r.referred_external_id,
      created_at:           r.created_at,
    }
  }
}

/// Aggregate view of everyone a referrer has brought in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralSummary {
  pub referrer_external_id: ExternalId,
  pub count:                u64,
  /// Newest first, at most [`SUMMARY_LIMIT`] entries.
  pub last_referrals:       Vec<ReferralEntry>,
}
