//! The referral consistency engine.
//!
//! Creating a referral is check, then insert, then recheck. The read before
//! the insert only short-circuits the common cases; the unique constraint on
//! the referred party is the real arbiter. When the insert loses a race the
//! engine re-reads and either returns the winner's row (same referrer, an
//! idempotent replay) or reports a conflict.

use crate::{
  Error, Result, RequestId,
  referral::{Referral, ReferralOutcome, ReferralSummary, SUMMARY_LIMIT},
  store::{ReferralStore, StoreError as _},
  user::ExternalId,
};

const ALREADY_REFERRED: &str = "referred user already has a referrer";

// ─── Validation ──────────────────────────────────────────────────────────────

pub(crate) fn ensure_positive(field: &str, id: ExternalId) -> Result<()> {
  if id <= 0 {
    return Err(Error::validation(format!("{field} must be positive")));
  }
  Ok(())
}

pub(crate) fn validate_pair(referrer: ExternalId, referred: ExternalId) -> Result<()> {
  ensure_positive("referrer id", referrer)?;
  ensure_positive("referred id", referred)?;
  if referrer == referred {
    return Err(Error::validation("referrer and referred cannot be the same"));
  }
  Ok(())
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Record that `referrer` brought in `referred`.
///
/// Returns the stored referral and whether this call created it. Submitting
/// the same pair again is not an error.
pub async fn create_referral<S>(
  store: &S,
  ctx: &RequestId,
  referrer: ExternalId,
  referred: ExternalId,
) -> Result<ReferralOutcome>
where
  S: ReferralStore,
{
  validate_pair(referrer, referred)?;

  if let Some(existing) = store
    .get_referral_by_referred(referred)
    .await
    .map_err(Error::store)?
  {
    return replay_or_conflict(existing, referrer);
  }

  match store.create_referral(referrer, referred).await {
    Ok(referral) => {
      tracing::info!(
        request_id = %ctx,
        referrer,
        referred,
        referral_id = %referral.referral_id,
        "referral created"
      );
      Ok(ReferralOutcome { referral, created: true })
    }
    Err(err) if err.is_unique_violation() => {
      tracing::info!(
        request_id = %ctx,
        referrer,
        referred,
        "referral insert lost a race; re-reading"
      );
      match store
        .get_referral_by_referred(referred)
        .await
        .map_err(Error::store)?
      {
        Some(winner) => replay_or_conflict(winner, referrer),
        None => Err(Error::conflict(ALREADY_REFERRED)),
      }
    }
    Err(err) => Err(Error::store(err)),
  }
}

fn replay_or_conflict(existing: Referral, referrer: ExternalId) -> Result<ReferralOutcome> {
  if existing.referrer_external_id == referrer {
    Ok(ReferralOutcome { referral: existing, created: false })
  } else {
    Err(Error::conflict(ALREADY_REFERRED))
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Count and most recent referrals made by `referrer`.
pub async fn get_referral_summary<S>(store: &S, referrer: ExternalId) -> Result<ReferralSummary>
where
  S: ReferralStore,
{
  ensure_positive("referrer id", referrer)?;

  let count = store
    .count_referrals_by_referrer(referrer)
    .await
    .map_err(Error::store)?;
  let last = store
    .last_referrals_by_referrer(referrer, SUMMARY_LIMIT)
    .await
    .map_err(Error::store)?;

  Ok(ReferralSummary {
    referrer_external_id: referrer,
    count,
    last_referrals: last.into_iter().map(Into::into).collect(),
  })
}
