//! Request correlation.
//!
//! A [`RequestId`] is passed explicitly into every service and engine call and
//! recorded on the log events they emit.

use std::fmt;

use uuid::Uuid;

/// Longest inbound id accepted verbatim; longer values are replaced.
const MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
  /// A fresh random id.
  pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

  /// Accept a caller-supplied id if it is printable ASCII of sane length.
  pub fn parse(value: &str) -> Option<Self> {
    let value = value.trim();
    (!value.is_empty() && value.len() <= MAX_LEN && value.bytes().all(|b| b.is_ascii_graphic()))
      .then(|| Self(value.to_owned()))
  }

  /// Reuse a caller-supplied id when [`parse`](Self::parse) accepts it,
  /// otherwise generate one.
  pub fn from_header(value: Option<&str>) -> Self {
    value.and_then(Self::parse).unwrap_or_else(Self::generate)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for RequestId {
  fn default() -> Self { Self::generate() }
}

impl fmt::Display for RequestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
