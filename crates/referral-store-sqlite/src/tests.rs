//! Integration tests for the SQLite backend against on-disk databases.
//!
//! Units of work open their own connections, so every test gets a fresh file
//! in a temporary directory rather than an in-memory database.

use std::{sync::Arc, time::Duration};

use referral_core::{
  Error as CoreError, ReferralService, RequestId,
  store::{ReferralStore, StoreError as _, UserStore},
  uow::{Database, UnitOfWork},
};
use tempfile::TempDir;

use crate::SqliteDatabase;

struct Fixture {
  // Held so the directory outlives the test body.
  _dir: TempDir,
  db:   SqliteDatabase,
  svc:  Arc<ReferralService<SqliteDatabase>>,
}

async fn fixture() -> Fixture {
  let dir = TempDir::new().expect("temp dir");
  let db = SqliteDatabase::open(dir.path().join("referrals.db"))
    .await
    .expect("open database");
  Fixture { _dir: dir, svc: Arc::new(ReferralService::new(db.clone())), db }
}

fn ctx() -> RequestId { RequestId::generate() }

fn referral_rows(db: &SqliteDatabase, referred: i64) -> i64 {
  rusqlite::Connection::open(db.path())
    .unwrap()
    .query_row(
      "SELECT COUNT(*) FROM referrals WHERE referred_external_id = ?1",
      [referred],
      |row| row.get(0),
    )
    .unwrap()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_init_is_idempotent() {
  let f = fixture().await;
  f.db.init_schema().await.unwrap();
  SqliteDatabase::open(f.db.path()).await.unwrap();
}

#[tokio::test]
async fn unreachable_path_is_a_connection_error() {
  let dir = TempDir::new().unwrap();
  let db = SqliteDatabase::new(dir.path().join("missing").join("referrals.db"));

  let err = db.begin().await.err().expect("begin should fail");
  assert!(matches!(err, CoreError::Connection(_)), "{err}");

  let svc = ReferralService::new(db);
  assert!(matches!(svc.health().await, Err(CoreError::Connection(_))));
  assert!(matches!(
    svc.create_referral(&ctx(), 1, 2).await,
    Err(CoreError::Connection(_))
  ));
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_user() {
  let f = fixture().await;
  let unit = f.db.begin().await.unwrap();

  assert!(unit.store().get_user(5).await.unwrap().is_none());
  let created = unit.store().upsert_user(5).await.unwrap();
  let again = unit.store().upsert_user(5).await.unwrap();
  let fetched = unit.store().get_user(5).await.unwrap().unwrap();

  assert_eq!(created, again);
  assert_eq!(created, fetched);
  unit.commit().await.unwrap();
}

#[tokio::test]
async fn duplicate_referral_reports_unique_violation() {
  let f = fixture().await;
  let unit = f.db.begin().await.unwrap();
  let store = unit.store();

  let first = store.create_referral(1, 2).await.unwrap();
  let err = store.create_referral(3, 2).await.unwrap_err();
  assert!(err.is_unique_violation(), "{err}");

  // The failed insert did not poison the transaction.
  let fetched = store.get_referral_by_referred(2).await.unwrap().unwrap();
  assert_eq!(fetched, first);
  unit.commit().await.unwrap();

  assert_eq!(referral_rows(&f.db, 2), 1);
}

#[tokio::test]
async fn self_referral_check_is_not_a_unique_violation() {
  let f = fixture().await;
  let unit = f.db.begin().await.unwrap();

  let err = unit.store().create_referral(4, 4).await.unwrap_err();
  assert!(!err.is_unique_violation(), "{err}");
}

#[tokio::test]
async fn last_referrals_are_newest_first_and_limited() {
  let f = fixture().await;
  for referred in 10..17 {
    f.svc.create_referral(&ctx(), 1, referred).await.unwrap();
  }

  let summary = f.svc.get_referral_summary(&ctx(), 1).await.unwrap();
  assert_eq!(summary.count, 7);
  let ids: Vec<_> = summary
    .last_referrals
    .iter()
    .map(|e| e.referred_external_id)
    .collect();
  assert_eq!(ids, vec![16, 15, 14, 13, 12]);
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn resubmission_returns_same_record() {
  let f = fixture().await;

  let first = f.svc.create_referral(&ctx(), 7, 42).await.unwrap();
  let second = f.svc.create_referral(&ctx(), 7, 42).await.unwrap();

  assert!(first.created);
  assert!(!second.created);
  assert_eq!(first.referral, second.referral);
}

#[tokio::test]
async fn conflict_leaves_referral_unchanged() {
  let f = fixture().await;

  let original = f.svc.create_referral(&ctx(), 1, 9).await.unwrap().referral;
  let err = f.svc.create_referral(&ctx(), 2, 9).await.unwrap_err();
  assert!(matches!(err, CoreError::Conflict(_)));

  let unit = f.db.begin().await.unwrap();
  let stored = unit.store().get_referral_by_referred(9).await.unwrap();
  assert_eq!(stored, Some(original));
}

#[tokio::test]
async fn status_aggregates_after_registration() {
  let f = fixture().await;

  let outcome = f.svc.register_referral(&ctx(), 7, 42).await.unwrap();
  assert!(outcome.created);

  let referred = f.svc.get_user_status(&ctx(), 42).await.unwrap();
  assert_eq!(referred.referred_by, Some(7));

  let referrer = f.svc.get_user_status(&ctx(), 7).await.unwrap();
  assert_eq!(referrer.referral_count, 1);

  let summary = f.svc.get_referral_summary(&ctx(), 7).await.unwrap();
  assert_eq!(summary.count, 1);
  assert_eq!(summary.last_referrals[0].referred_external_id, 42);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
  let f = fixture().await;
  let err = f.svc.get_user_status(&ctx(), 999).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_submissions_converge() {
  let f = fixture().await;

  let tasks: Vec<_> = (0..6)
    .map(|_| {
      let svc = f.svc.clone();
      tokio::spawn(async move { svc.register_referral(&ctx(), 7, 42).await })
    })
    .collect();

  let mut outcomes = Vec::new();
  for task in tasks {
    outcomes.push(task.await.unwrap().unwrap());
  }

  assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
  let id = outcomes[0].referral.referral_id;
  assert!(outcomes.iter().all(|o| o.referral.referral_id == id));
  assert_eq!(referral_rows(&f.db, 42), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rival_referrers_yield_one_winner() {
  let f = fixture().await;

  let a = {
    let svc = f.svc.clone();
    tokio::spawn(async move { svc.create_referral(&ctx(), 1, 50).await })
  };
  let b = {
    let svc = f.svc.clone();
    tokio::spawn(async move { svc.create_referral(&ctx(), 2, 50).await })
  };
  let results = [a.await.unwrap(), b.await.unwrap()];

  let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
  assert_eq!(winners.len(), 1);
  assert!(winners[0].created);
  assert!(
    results
      .iter()
      .any(|r| matches!(r, Err(CoreError::Conflict(_))))
  );

  let unit = f.db.begin().await.unwrap();
  let stored = unit.store().get_referral_by_referred(50).await.unwrap().unwrap();
  assert_eq!(stored, winners[0].referral);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_return_one_user() {
  let f = fixture().await;

  let tasks: Vec<_> = (0..4)
    .map(|_| {
      let svc = f.svc.clone();
      tokio::spawn(async move { svc.upsert_user(&ctx(), 77).await })
    })
    .collect();

  let mut users = Vec::new();
  for task in tasks {
    users.push(task.await.unwrap().unwrap());
  }
  assert!(users.windows(2).all(|w| w[0] == w[1]));
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_referral_insert_commits_no_users() {
  let f = fixture().await;
  rusqlite::Connection::open(f.db.path())
    .unwrap()
    .execute_batch(
      "CREATE TRIGGER referrals_outage BEFORE INSERT ON referrals
       WHEN NEW.referrer_external_id = 13
       BEGIN SELECT RAISE(ABORT, 'storage outage'); END;",
    )
    .unwrap();

  let err = f.svc.register_referral(&ctx(), 13, 14).await.unwrap_err();
  assert!(matches!(err, CoreError::Store(_)), "{err}");

  for id in [13, 14] {
    let status = f.svc.get_user_status(&ctx(), id).await;
    assert!(matches!(status, Err(CoreError::NotFound(_))), "user {id} leaked");
  }
  assert_eq!(referral_rows(&f.db, 14), 0);
}

#[tokio::test]
async fn dropped_unit_commits_nothing() {
  let f = fixture().await;
  {
    let unit = f.db.begin().await.unwrap();
    unit.store().upsert_user(31).await.unwrap();
    unit.store().create_referral(30, 31).await.unwrap();
  }

  let err = f.svc.get_user_status(&ctx(), 31).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
  assert_eq!(referral_rows(&f.db, 31), 0);
}

#[tokio::test]
async fn reads_do_not_wait_for_an_open_writer() {
  let f = fixture().await;
  f.svc.register_referral(&ctx(), 7, 42).await.unwrap();

  let writer = f.db.begin().await.unwrap();
  writer.store().upsert_user(60).await.unwrap();

  let impatient =
    ReferralService::new(f.db.clone().with_busy_timeout(Duration::from_millis(50)));
  let status = impatient.get_user_status(&ctx(), 42).await.unwrap();
  assert_eq!(status.referred_by, Some(7));
  let summary = impatient.get_referral_summary(&ctx(), 7).await.unwrap();
  assert_eq!(summary.count, 1);
  impatient.health().await.unwrap();

  // The uncommitted write is invisible to readers.
  let err = impatient.get_user_status(&ctx(), 60).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));

  // A second writer still queues and gives up after the busy timeout.
  let err = impatient.upsert_user(&ctx(), 61).await.unwrap_err();
  assert!(matches!(err, CoreError::Connection(_)), "{err}");

  writer.commit().await.unwrap();
}

#[tokio::test]
async fn rollback_discards_writes() {
  let f = fixture().await;
  let unit = f.db.begin().await.unwrap();
  unit.store().upsert_user(8).await.unwrap();
  unit.rollback().await.unwrap();

  let unit = f.db.begin().await.unwrap();
  assert!(unit.store().get_user(8).await.unwrap().is_none());
}
