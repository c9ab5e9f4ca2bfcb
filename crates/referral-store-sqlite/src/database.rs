//! [`SqliteDatabase`] — opens one connection and one transaction per unit of
//! work.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use referral_core::uow::{Database, UnitOfWork};

use crate::{Error, Result, schema::SCHEMA, store::SqliteStore};

/// How long a unit waits for the write lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// A referral database stored in a single SQLite file.
///
/// Cloning is cheap; no connection is held between units.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
  path:         PathBuf,
  busy_timeout: Duration,
}

impl SqliteDatabase {
  /// Point at `path` without touching the filesystem.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), busy_timeout: DEFAULT_BUSY_TIMEOUT }
  }

  pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
    self.busy_timeout = busy_timeout;
    self
  }

  /// Open (or create) the database at `path` and run schema initialisation.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let db = Self::new(path);
    db.init_schema().await?;
    Ok(db)
  }

  pub fn path(&self) -> &Path { &self.path }

  pub async fn init_schema(&self) -> Result<()> {
    let conn = self.connect().await?;
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    conn.close().await?;
    tracing::debug!(path = %self.path.display(), "schema ready");
    Ok(())
  }

  async fn connect(&self) -> Result<tokio_rusqlite::Connection> {
    let conn = tokio_rusqlite::Connection::open(&self.path).await?;
    let busy_timeout = self.busy_timeout;
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }

  /// Connect and open a transaction with `sql`.
  async fn start(&self, sql: &'static str) -> referral_core::Result<SqliteUnit> {
    let conn = self.connect().await.map_err(referral_core::Error::connection)?;
    conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await
      .map_err(|e| referral_core::Error::connection(Error::from(e)))?;

    Ok(SqliteUnit { store: SqliteStore::new(conn) })
  }
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// One open transaction on a dedicated connection.
///
/// Write units start with `BEGIN IMMEDIATE` and hold the write lock for their
/// whole lifetime. Read units use a deferred `BEGIN` and, under WAL, never
/// wait for writers. Dropping the unit closes the connection, which discards
/// anything not yet committed.
pub struct SqliteUnit {
  store: SqliteStore,
}

impl Database for SqliteDatabase {
  type Unit = SqliteUnit;

  async fn begin(&self) -> referral_core::Result<SqliteUnit> {
    self.start("BEGIN IMMEDIATE").await
  }

  async fn begin_read(&self) -> referral_core::Result<SqliteUnit> { self.start("BEGIN").await }
}

impl UnitOfWork for SqliteUnit {
  type Store = SqliteStore;

  fn store(&self) -> &SqliteStore { &self.store }

  async fn commit(self) -> referral_core::Result<()> {
    self.store.end("COMMIT").await.map_err(referral_core::Error::store)
  }

  async fn rollback(self) -> referral_core::Result<()> {
    self.store.end("ROLLBACK").await.map_err(referral_core::Error::store)
  }
}
