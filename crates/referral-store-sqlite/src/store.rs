//! [`SqliteStore`] — the SQLite implementation of the store traits.

use referral_core::{
  referral::Referral,
  store::{ReferralStore, UserStore},
  user::{ExternalId, User},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawReferral, RawUser, encode_dt, encode_uuid, now},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store handle bound to one unit of work.
///
/// The connection is owned by the unit and already inside `BEGIN IMMEDIATE`,
/// so every statement issued here joins that transaction.
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  pub(crate) fn new(conn: tokio_rusqlite::Connection) -> Self { Self { conn } }

  /// Run `sql` (`COMMIT` or `ROLLBACK`) and close the connection.
  pub(crate) async fn end(self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    self.conn.close().await?;
    Ok(())
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = crate::Error;

  async fn get_user(&self, external_id: ExternalId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE external_id = ?1", RawUser::COLUMNS),
              rusqlite::params![external_id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn upsert_user(&self, external_id: ExternalId) -> Result<User> {
    let user_id = encode_uuid(Uuid::new_v4());
    let at_str  = encode_dt(now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        let select = format!("SELECT {} FROM users WHERE external_id = ?1", RawUser::COLUMNS);
        if let Some(existing) = conn
          .query_row(&select, rusqlite::params![external_id], RawUser::from_row)
          .optional()?
        {
          return Ok(existing);
        }

        // A failed insert rolls back to the savepoint and leaves the unit's
        // transaction usable for the caller's re-read.
        let sp = conn.savepoint_with_name("upsert_user")?;
        sp.execute(
          "INSERT INTO users (user_id, external_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, external_id, at_str],
        )?;
        sp.commit()?;

        Ok(RawUser { user_id, external_id, created_at: at_str })
      })
      .await?;

    raw.into_user()
  }
}

// ─── ReferralStore impl ──────────────────────────────────────────────────────

impl ReferralStore for SqliteStore {
  type Error = crate::Error;

  async fn get_referral_by_referred(&self, referred: ExternalId) -> Result<Option<Referral>> {
    let raw: Option<RawReferral> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM referrals WHERE referred_external_id = ?1",
                RawReferral::COLUMNS
              ),
              rusqlite::params![referred],
              RawReferral::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReferral::into_referral).transpose()
  }

  async fn create_referral(&self, referrer: ExternalId, referred: ExternalId) -> Result<Referral> {
    let referral = Referral {
      referral_id:          Uuid::new_v4(),
      referrer_external_id: referrer,
      referred_external_id: referred,
      created_at:           now(),
    };

    let id_str = encode_uuid(referral.referral_id);
    let at_str = encode_dt(referral.created_at);

    self
      .conn
      .call(move |conn| {
        let sp = conn.savepoint_with_name("create_referral")?;
        sp.execute(
          "INSERT INTO referrals (
             referral_id, referrer_external_id, referred_external_id, created_at
           ) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, referrer, referred, at_str],
        )?;
        sp.commit()?;
        Ok(())
      })
      .await?;

    Ok(referral)
  }

  async fn count_referrals_by_referrer(&self, referrer: ExternalId) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM referrals WHERE referrer_external_id = ?1",
          rusqlite::params![referrer],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn last_referrals_by_referrer(
    &self,
    referrer: ExternalId,
    limit: usize,
  ) -> Result<Vec<Referral>> {
    let limit_val = limit as i64;

    let raws: Vec<RawReferral> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM referrals
           WHERE referrer_external_id = ?1
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2",
          RawReferral::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![referrer, limit_val], RawReferral::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReferral::into_referral).collect()
  }
}
