//! Error types for `refill-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("patient name must not be empty")]
  EmptyPatientName,

  #[error("invalid subscription duration: {0} (expected 1, 3, or 6)")]
  InvalidDuration(i64),

  #[error("fulfillment date out of calendar range")]
  ScheduleOverflow,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
