//! Subscription types — the aggregate root of the Refill tracker.
//!
//! A subscription is a patient's multi-month prescription plan. It owns an
//! ordered fulfillment schedule (one slot per month) and an append-only
//! communication log. The stored status and the physician approval track
//! are independent; the display status is derived on read, never persisted
//! (see [`crate::status`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Duration ────────────────────────────────────────────────────────────────

/// Plan length in months. Restricted to the set the pharmacy sells;
/// fixed at creation and immutable thereafter.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Duration {
  OneMonth,
  ThreeMonths,
  SixMonths,
}

impl Duration {
  /// Number of monthly fulfillment slots this duration produces.
  pub fn months(self) -> u32 {
    match self {
      Self::OneMonth => 1,
      Self::ThreeMonths => 3,
      Self::SixMonths => 6,
    }
  }
}

impl TryFrom<u8> for Duration {
  type Error = Error;

  fn try_from(n: u8) -> Result<Self, Error> {
    match n {
      1 => Ok(Self::OneMonth),
      3 => Ok(Self::ThreeMonths),
      6 => Ok(Self::SixMonths),
      other => Err(Error::InvalidDuration(i64::from(other))),
    }
  }
}

impl From<Duration> for u8 {
  fn from(d: Duration) -> Self { d.months() as u8 }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Pharmacy-side progress of a subscription that is not on hold.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
  #[default]
  Pending,
  Approved,
  Fulfilled,
  RenewalNeeded,
}

/// Pharmacy fulfillment status. `OnHold` is sticky: while a subscription is
/// on hold, no fulfillment-based derivation applies, and only an explicit
/// edit can lift it. The hold is a variant rather than a flag so the sticky
/// rule is enforced structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "substatus", rename_all = "snake_case")]
pub enum Status {
  Active(ActiveStatus),
  OnHold,
}

impl Default for Status {
  fn default() -> Self { Self::Active(ActiveStatus::Pending) }
}

impl Status {
  pub fn is_on_hold(&self) -> bool { matches!(self, Self::OnHold) }
}

/// Physician approval track — independent of [`Status`]; never derived.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PhysicianStatus {
  #[default]
  Pending,
  Approved,
}

// ─── Fulfillment ─────────────────────────────────────────────────────────────

/// One scheduled monthly shipment within a subscription.
///
/// `slot` is the stable 0-based identifier assigned at creation; shipment
/// marking targets a slot, not an array position or a date, so matching is
/// unambiguous even though the array is rebuilt on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
  pub slot:             u32,
  pub fulfillment_date: DateTime<Utc>,
  pub shipped:          bool,
  pub tracking:         Option<String>,
}

// ─── Communication log ───────────────────────────────────────────────────────

/// Who or what wrote a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
  System,
  PharmacyStaff,
}

impl std::fmt::Display for Actor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::System => write!(f, "System"),
      Self::PharmacyStaff => write!(f, "Pharmacy Staff"),
    }
  }
}

/// An entry in a subscription's communication log. Entries are append-only
/// and stored oldest-first; `date` is set at append time and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub date:    DateTime<Utc>,
  pub message: String,
  pub actor:   Actor,
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// The aggregate root. `subscription_id`, `start_date`, and `duration` are
/// set once at creation; `fulfillments` always has exactly
/// `duration.months()` entries in chronological slot order.
///
/// `revision` increments on every persisted mutation and backs the store's
/// optimistic concurrency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:   Uuid,
  pub patient_name:      String,
  /// True while a human still needs to call the patient about a new
  /// prescription; cleared only by explicit edit.
  pub new_rx_call:       bool,
  pub duration:          Duration,
  pub start_date:        DateTime<Utc>,
  pub status:            Status,
  pub physician_status:  PhysicianStatus,
  pub fulfillments:      Vec<Fulfillment>,
  pub communication_log: Vec<LogEntry>,
  pub revision:          u64,
}

// ─── NewSubscription ─────────────────────────────────────────────────────────

/// Input to [`crate::store::SubscriptionStore::create`]. The id, start date,
/// schedule, and seed log entry are assembled by
/// [`crate::ops::build_subscription`]; they are not accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscription {
  pub patient_name:     String,
  pub duration:         Duration,
  #[serde(default)]
  pub status:           Status,
  #[serde(default)]
  pub physician_status: PhysicianStatus,
  #[serde(default)]
  pub new_rx_call:      bool,
}

// ─── SubscriptionEdit ────────────────────────────────────────────────────────

/// The editable subset of a subscription. Fields left `None` are preserved.
/// `start_date`, `duration`, `fulfillments`, and `communication_log` are not
/// representable here and therefore cannot be changed by an edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionEdit {
  pub patient_name:     Option<String>,
  pub status:           Option<Status>,
  pub physician_status: Option<PhysicianStatus>,
  pub new_rx_call:      Option<bool>,
}
