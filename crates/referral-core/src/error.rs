//! Error types for `referral-core`.

use thiserror::Error;

/// A boxed error from a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input: a non-positive id or a self-referral. Detected before
  /// any store access.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The requested write contradicts an existing referral.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// Storage could not be reached when opening a unit of work. Callers should
  /// treat this as retryable.
  #[error("storage unavailable: {0}")]
  Connection(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    Self::Conflict(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::NotFound(message.into())
  }

  pub fn connection(source: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Connection(Box::new(source))
  }

  pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(source))
  }

  /// `true` for failures a caller may retry unchanged.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::Connection(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
