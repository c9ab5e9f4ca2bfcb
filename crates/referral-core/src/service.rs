//! [`ReferralService`] runs every inbound operation, each in its own unit of
//! work.
//!
//! Front ends (HTTP, CLI) call these methods and never open transactions
//! themselves. Input is validated before a unit is opened, so malformed
//! requests are rejected even while storage is down.

use crate::{
  Result, RequestId, engine, identity,
  referral::{ReferralOutcome, ReferralSummary},
  uow::{Database, UnitOfWork, finish},
  user::{ExternalId, User, UserStatus},
};

/// Runs engine operations against a [`Database`].
///
/// Holds no mutable state; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferralService<D> {
  db: D,
}

impl<D: Database> ReferralService<D> {
  pub fn new(db: D) -> Self { Self { db } }

  pub async fn upsert_user(&self, ctx: &RequestId, external_id: ExternalId) -> Result<User> {
    engine::ensure_positive("external id", external_id)?;

    let unit = self.db.begin().await?;
    let outcome = identity::upsert_user(unit.store(), ctx, external_id).await;
    finish(unit, outcome, ctx).await
  }

  /// Create a referral between two ids without touching the user table.
  pub async fn create_referral(
    &self,
    ctx: &RequestId,
    referrer: ExternalId,
    referred: ExternalId,
  ) -> Result<ReferralOutcome> {
    engine::validate_pair(referrer, referred)?;

    let unit = self.db.begin().await?;
    let outcome = engine::create_referral(unit.store(), ctx, referrer, referred).await;
    finish(unit, outcome, ctx).await
  }

  /// Upsert both users and create the referral between them, atomically.
  pub async fn register_referral(
    &self,
    ctx: &RequestId,
    referrer: ExternalId,
    referred: ExternalId,
  ) -> Result<ReferralOutcome> {
    engine::validate_pair(referrer, referred)?;

    let unit = self.db.begin().await?;
    let store = unit.store();
    let outcome = async {
      identity::upsert_user(store, ctx, referred).await?;
      identity::upsert_user(store, ctx, referrer).await?;
      engine::create_referral(store, ctx, referrer, referred).await
    }
    .await;
    finish(unit, outcome, ctx).await
  }

  /// Upsert `external_id` and, when given, record `referrer` as its referrer.
  ///
  /// Returns `None` when no referrer was supplied.
  pub async fn register_user(
    &self,
    ctx: &RequestId,
    external_id: ExternalId,
    referrer: Option<ExternalId>,
  ) -> Result<Option<ReferralOutcome>> {
    match referrer {
      Some(referrer) => self.register_referral(ctx, referrer, external_id).await.map(Some),
      None => self.upsert_user(ctx, external_id).await.map(|_| None),
    }
  }

  pub async fn get_user_status(
    &self,
    ctx: &RequestId,
    external_id: ExternalId,
  ) -> Result<UserStatus> {
    engine::ensure_positive("external id", external_id)?;

    let unit = self.db.begin_read().await?;
    let outcome = identity::get_user_status(unit.store(), external_id).await;
    finish(unit, outcome, ctx).await
  }

  pub async fn get_referral_summary(
    &self,
    ctx: &RequestId,
    referrer: ExternalId,
  ) -> Result<ReferralSummary> {
    engine::ensure_positive("referrer id", referrer)?;

    let unit = self.db.begin_read().await?;
    let outcome = engine::get_referral_summary(unit.store(), referrer).await;
    finish(unit, outcome, ctx).await
  }

  /// Open and discard a unit of work to prove storage is reachable.
  pub async fn health(&self) -> Result<()> {
    let unit = self.db.begin_read().await?;
    unit.rollback().await
  }
}
