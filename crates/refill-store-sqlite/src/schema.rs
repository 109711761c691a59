//! SQL schema for the Refill SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `fulfillments` and `communication_log` are JSON arrays replaced whole on
/// every write; the subscription row is the unit of mutation, and `revision`
/// backs the conditional-write concurrency check.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id   TEXT PRIMARY KEY,
    patient_name      TEXT NOT NULL,
    new_rx_call       INTEGER NOT NULL DEFAULT 0,
    duration_months   INTEGER NOT NULL,   -- 1 | 3 | 6
    start_date        TEXT NOT NULL,      -- ISO 8601 UTC; store-assigned
    status            TEXT NOT NULL,      -- 'pending' | 'approved' | 'fulfilled' | 'renewal_needed' | 'on_hold'
    physician_status  TEXT NOT NULL,      -- 'pending' | 'approved'
    fulfillments      TEXT NOT NULL,      -- JSON array of Fulfillment
    communication_log TEXT NOT NULL,      -- JSON array of LogEntry; append-only
    revision          INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS subscriptions_start_idx ON subscriptions(start_date);

PRAGMA user_version = 1;
";
