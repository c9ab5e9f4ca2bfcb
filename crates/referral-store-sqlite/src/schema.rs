//! SQL schema for the referral SQLite store.
//!
//! Executed once at startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    external_id INTEGER NOT NULL UNIQUE CHECK (external_id > 0),
    created_at  TEXT NOT NULL     -- RFC 3339 UTC, microseconds
);

-- Referrals are append-only: no UPDATE or DELETE is ever issued.
-- The UNIQUE constraint on the referred party is the only arbiter between
-- concurrent writers.
CREATE TABLE IF NOT EXISTS referrals (
    referral_id          TEXT PRIMARY KEY,
    referrer_external_id INTEGER NOT NULL CHECK (referrer_external_id > 0),
    referred_external_id INTEGER NOT NULL CHECK (referred_external_id > 0),
    created_at           TEXT NOT NULL,
    CONSTRAINT uq_referrals_referred UNIQUE (referred_external_id),
    CONSTRAINT ck_referrals_no_self_referral
        CHECK (referrer_external_id <> referred_external_id)
);

CREATE INDEX IF NOT EXISTS referrals_referrer_idx
    ON referrals(referrer_external_id, created_at);

PRAGMA user_version = 1;
";
