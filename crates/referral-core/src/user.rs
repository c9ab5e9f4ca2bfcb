//! Users: the identities referrals are recorded between.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The stable numeric identity supplied by the calling channel (e.g. a
/// messaging account id). Only strictly positive values are valid.
pub type ExternalId = i64;

/// A known user. Created on first sight and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:     Uuid,
  pub external_id: ExternalId,
  pub created_at:  DateTime<Utc>,
}

/// Read model returned by [`crate::identity::get_user_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
  pub external_id:    ExternalId,
  /// The user's referrer, if they were referred.
  pub referred_by:    Option<ExternalId>,
  /// How many users this user has referred.
  pub referral_count: u64,
}
