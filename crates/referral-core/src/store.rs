//! The store traits the engine is written against.
//!
//! Implemented by storage backends (e.g. `referral-store-sqlite`). A store
//! handle is always bound to one unit of work, so every call made through it
//! shares that unit's transaction.

use std::future::Future;

use crate::{
  referral::Referral,
  user::{ExternalId, User},
};

/// Errors raised by a store backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when a write was rejected because it would duplicate a value
  /// constrained to be unique. The engine treats this as a lost race and
  /// re-reads; it is never surfaced to callers as-is.
  fn is_unique_violation(&self) -> bool;
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub trait UserStore: Send + Sync {
  type Error: StoreError;

  /// Retrieve a user by external id. Returns `None` if unknown.
  fn get_user(
    &self,
    external_id: ExternalId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Get-or-create the user with `external_id`.
  ///
  /// A backend may report a uniqueness violation when a concurrent writer
  /// inserted the same id between its read and its write. The failed insert
  /// must not poison the enclosing transaction.
  fn upsert_user(
    &self,
    external_id: ExternalId,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;
}

// ─── Referrals ───────────────────────────────────────────────────────────────

pub trait ReferralStore: Send + Sync {
  type Error: StoreError;

  /// The referral whose referred party is `referred`, if any.
  fn get_referral_by_referred(
    &self,
    referred: ExternalId,
  ) -> impl Future<Output = Result<Option<Referral>, Self::Error>> + Send + '_;

  /// Insert a new referral. `created_at` is set by the store.
  ///
  /// Fails with a uniqueness violation if `referred` already has a referral.
  /// The failed insert must not poison the enclosing transaction.
  fn create_referral(
    &self,
    referrer: ExternalId,
    referred: ExternalId,
  ) -> impl Future<Output = Result<Referral, Self::Error>> + Send + '_;

  fn count_referrals_by_referrer(
    &self,
    referrer: ExternalId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The `limit` most recent referrals made by `referrer`, newest first.
  fn last_referrals_by_referrer(
    &self,
    referrer: ExternalId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Referral>, Self::Error>> + Send + '_;
}
