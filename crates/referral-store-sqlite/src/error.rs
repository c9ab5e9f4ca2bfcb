//! Error type for `referral-store-sqlite`.

use referral_core::store::StoreError;
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// An insert collided with a `UNIQUE` constraint.
  #[error("unique constraint violated: {0}")]
  UniqueViolation(String),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, message)) =
      &err
      && failure.code == ErrorCode::ConstraintViolation
      && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    {
      return Self::UniqueViolation(
        message.clone().unwrap_or_else(|| failure.to_string()),
      );
    }
    Self::Database(err)
  }
}

impl StoreError for Error {
  fn is_unique_violation(&self) -> bool { matches!(self, Self::UniqueViolation(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
