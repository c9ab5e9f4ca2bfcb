//! The unit-of-work contract.
//!
//! A [`Database`] opens units; a [`UnitOfWork`] owns exactly one physical
//! transaction and hands out a store handle bound to it. Every engine call
//! made through that handle is part of the same atomic write.

use std::future::Future;

use crate::{
  Result, RequestId,
  store::{ReferralStore, UserStore},
};

/// One open transaction.
///
/// Dropping a unit without calling [`commit`](Self::commit) must never commit
/// its writes.
pub trait UnitOfWork: Send {
  type Store: UserStore + ReferralStore;

  /// The store handle bound to this unit's transaction.
  fn store(&self) -> &Self::Store;

  fn commit(self) -> impl Future<Output = Result<()>> + Send;

  fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}

/// Source of units of work.
pub trait Database: Send + Sync {
  type Unit: UnitOfWork;

  /// Open a connection and start a transaction.
  ///
  /// Fails with [`crate::Error::Connection`] if storage cannot be reached, so callers
  /// can tell an outage apart from a rejected request.
  fn begin(&self) -> impl Future<Output = Result<Self::Unit>> + Send + '_;

  /// Start a unit that only reads.
  ///
  /// Backends that serialise writers can skip the write lock here so reads do
  /// not queue behind open writes. Defaults to [`begin`](Self::begin).
  fn begin_read(&self) -> impl Future<Output = Result<Self::Unit>> + Send + '_ { self.begin() }
}

/// Close `unit` according to `outcome`: commit on `Ok`, roll back on `Err`.
///
/// A failed rollback is logged and the original error returned; the backend
/// discards the transaction when the unit is dropped.
pub async fn finish<U, T>(unit: U, outcome: Result<T>, ctx: &RequestId) -> Result<T>
where
  U: UnitOfWork,
{
  match outcome {
    Ok(value) => {
      unit.commit().await?;
      Ok(value)
    }
    Err(err) => {
      if let Err(rollback_err) = unit.rollback().await {
        tracing::warn!(
          request_id = %ctx,
          error = %rollback_err,
          "rollback failed after error: {err}"
        );
      }
      Err(err)
    }
  }
}

