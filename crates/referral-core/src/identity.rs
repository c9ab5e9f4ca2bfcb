//! Identity resolution and status lookup.

use crate::{
  Error, Result, RequestId,
  engine::ensure_positive,
  store::{ReferralStore, StoreError as _, UserStore},
  user::{ExternalId, User, UserStatus},
};

/// Get-or-create the user with `external_id`.
///
/// Two callers upserting the same id at once both receive the row that
/// committed first.
pub async fn upsert_user<S>(store: &S, ctx: &RequestId, external_id: ExternalId) -> Result<User>
where
  S: UserStore,
{
  ensure_positive("external id", external_id)?;

  if let Some(user) = store.get_user(external_id).await.map_err(Error::store)? {
    return Ok(user);
  }

  match store.upsert_user(external_id).await {
    Ok(user) => {
      tracing::debug!(request_id = %ctx, external_id, "user created");
      Ok(user)
    }
    Err(err) if err.is_unique_violation() => {
      tracing::info!(
        request_id = %ctx,
        external_id,
        "user insert lost a race; re-reading"
      );
      store
        .get_user(external_id)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::store(err))
    }
    Err(err) => Err(Error::store(err)),
  }
}

/// Who referred `external_id`, and how many users they have referred.
pub async fn get_user_status<S>(store: &S, external_id: ExternalId) -> Result<UserStatus>
where
  S: UserStore + ReferralStore,
{
  ensure_positive("external id", external_id)?;

  if store
    .get_user(external_id)
    .await
    .map_err(Error::store)?
    .is_none()
  {
    return Err(Error::not_found(format!("user {external_id} not found")));
  }

  let referred_by = store
    .get_referral_by_referred(external_id)
    .await
    .map_err(Error::store)?
    .map(|r| r.referrer_external_id);
  let referral_count = store
    .count_referrals_by_referrer(external_id)
    .await
    .map_err(Error::store)?;

  Ok(UserStatus { external_id, referred_by, referral_count })
}
