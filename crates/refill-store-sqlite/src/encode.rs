//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The fulfillment schedule
//! and communication log are stored as compact JSON arrays. Statuses are
//! flat lowercase strings. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use refill_core::subscription::{
  ActiveStatus, Duration, Fulfillment, LogEntry, PhysicianStatus, Status,
  Subscription,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Duration ────────────────────────────────────────────────────────────────

pub fn encode_duration(d: Duration) -> i64 { i64::from(d.months()) }

pub fn decode_duration(n: i64) -> Result<Duration> {
  let narrow = u8::try_from(n)
    .map_err(|_| Error::Core(refill_core::Error::InvalidDuration(n)))?;
  Ok(Duration::try_from(narrow).map_err(Error::Core)?)
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str {
  match s {
    Status::Active(ActiveStatus::Pending) => "pending",
    Status::Active(ActiveStatus::Approved) => "approved",
    Status::Active(ActiveStatus::Fulfilled) => "fulfilled",
    Status::Active(ActiveStatus::RenewalNeeded) => "renewal_needed",
    Status::OnHold => "on_hold",
  }
}

pub fn decode_status(s: &str) -> Result<Status> {
  match s {
    "pending" => Ok(Status::Active(ActiveStatus::Pending)),
    "approved" => Ok(Status::Active(ActiveStatus::Approved)),
    "fulfilled" => Ok(Status::Active(ActiveStatus::Fulfilled)),
    "renewal_needed" => Ok(Status::Active(ActiveStatus::RenewalNeeded)),
    "on_hold" => Ok(Status::OnHold),
    other => Err(Error::DateParse(format!("unknown status: {other:?}"))),
  }
}

// ─── PhysicianStatus ─────────────────────────────────────────────────────────

pub fn encode_physician_status(s: PhysicianStatus) -> &'static str {
  match s {
    PhysicianStatus::Pending => "pending",
    PhysicianStatus::Approved => "approved",
  }
}

pub fn decode_physician_status(s: &str) -> Result<PhysicianStatus> {
  match s {
    "pending" => Ok(PhysicianStatus::Pending),
    "approved" => Ok(PhysicianStatus::Approved),
    other => {
      Err(Error::DateParse(format!("unknown physician status: {other:?}")))
    }
  }
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_fulfillments(fulfillments: &[Fulfillment]) -> Result<String> {
  Ok(serde_json::to_string(fulfillments)?)
}

pub fn decode_fulfillments(s: &str) -> Result<Vec<Fulfillment>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_log(log: &[LogEntry]) -> Result<String> {
  Ok(serde_json::to_string(log)?)
}

pub fn decode_log(s: &str) -> Result<Vec<LogEntry>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:   String,
  pub patient_name:      String,
  pub new_rx_call:       bool,
  pub duration_months:   i64,
  pub start_date:        String,
  pub status:            String,
  pub physician_status:  String,
  pub fulfillments:      String,
  pub communication_log: String,
  pub revision:          i64,
}

impl RawSubscription {
  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:   decode_uuid(&self.subscription_id)?,
      patient_name:      self.patient_name,
      new_rx_call:       self.new_rx_call,
      duration:          decode_duration(self.duration_months)?,
      start_date:        decode_dt(&self.start_date)?,
      status:            decode_status(&self.status)?,
      physician_status:  decode_physician_status(&self.physician_status)?,
      fulfillments:      decode_fulfillments(&self.fulfillments)?,
      communication_log: decode_log(&self.communication_log)?,
      revision:          self.revision as u64,
    })
  }
}
