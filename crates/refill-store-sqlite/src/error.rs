//! Error type for `refill-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] refill_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A conditional write found a different revision than the caller
  /// expected; the caller's snapshot is stale and must be re-fetched.
  #[error("revision conflict: expected {expected}, found {actual}")]
  RevisionConflict { expected: u64, actual: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
