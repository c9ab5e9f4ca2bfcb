//! SQLite backend for the referral ledger.
//!
//! Every unit of work gets its own [`tokio_rusqlite`] connection running
//! `BEGIN IMMEDIATE`, so concurrent writers queue on the database write lock
//! and the `UNIQUE` constraints decide who wins.

mod database;
mod encode;
mod schema;
mod store;

pub mod error;

pub use database::{DEFAULT_BUSY_TIMEOUT, SqliteDatabase, SqliteUnit};
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
