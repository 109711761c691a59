//! Mutation transforms.
//!
//! Each operation on a subscription is a pure function from the last
//! observed record to its replacement; the store crate wraps these in a
//! read-modify-write cycle and handles persistence. Every transform that
//! touches the fulfillment schedule also appends a communication log entry,
//! so the log stays the system of record for shipment events.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  schedule::generate_schedule,
  subscription::{
    Actor, LogEntry, NewSubscription, Subscription, SubscriptionEdit,
  },
};

/// Assemble a full subscription record from creation input.
///
/// Sets `start_date = now`, generates the fulfillment schedule, and seeds
/// the communication log with a single system entry, so the log is never
/// empty for a persisted record.
pub fn build_subscription(
  input: NewSubscription,
  id: Uuid,
  now: DateTime<Utc>,
) -> Result<Subscription> {
  if input.patient_name.trim().is_empty() {
    return Err(Error::EmptyPatientName);
  }

  let fulfillments = generate_schedule(now, input.duration)?;

  Ok(Subscription {
    subscription_id:   id,
    patient_name:      input.patient_name,
    new_rx_call:       input.new_rx_call,
    duration:          input.duration,
    start_date:        now,
    status:            input.status,
    physician_status:  input.physician_status,
    fulfillments,
    communication_log: vec![LogEntry {
      date:    now,
      message: "Subscription created.".into(),
      actor:   Actor::System,
    }],
    revision:          0,
  })
}

/// Apply an edit to the editable fields, preserving everything else.
///
/// `start_date`, `duration`, the fulfillment schedule, and the log cannot
/// change through this path; the returned record differs from `current`
/// only in the fields the edit sets.
pub fn apply_edit(
  current: &Subscription,
  edit: SubscriptionEdit,
) -> Result<Subscription> {
  if let Some(name) = &edit.patient_name
    && name.trim().is_empty()
  {
    return Err(Error::EmptyPatientName);
  }

  let mut next = current.clone();
  if let Some(name) = edit.patient_name {
    next.patient_name = name;
  }
  if let Some(status) = edit.status {
    next.status = status;
  }
  if let Some(physician_status) = edit.physician_status {
    next.physician_status = physician_status;
  }
  if let Some(new_rx_call) = edit.new_rx_call {
    next.new_rx_call = new_rx_call;
  }
  Ok(next)
}

/// Mark one fulfillment slot as shipped and record the event in the log.
///
/// Rebuilds the schedule with the target slot set `shipped = true` and the
/// given tracking value; every other slot passes through unchanged. Returns
/// `None` when the slot is unknown or already shipped — a stale caller
/// degrades to a no-op rather than an error, and no log entry is written
/// for a shipment that did not happen.
pub fn apply_shipment(
  current: &Subscription,
  slot: u32,
  tracking: Option<String>,
  now: DateTime<Utc>,
) -> Option<Subscription> {
  let target = current
    .fulfillments
    .iter()
    .find(|f| f.slot == slot && !f.shipped)?;

  let message = match tracking.as_deref() {
    Some(t) if !t.trim().is_empty() => format!(
      "Fulfillment for {} marked shipped. Tracking: {t}.",
      target.fulfillment_date.format("%Y-%m-%d"),
    ),
    _ => format!(
      "Fulfillment for {} marked shipped. No tracking number.",
      target.fulfillment_date.format("%Y-%m-%d"),
    ),
  };

  let mut next = current.clone();
  for f in &mut next.fulfillments {
    if f.slot == slot {
      f.shipped = true;
      f.tracking = tracking.clone();
    }
  }
  next.communication_log.push(LogEntry {
    date: now,
    message,
    actor: Actor::PharmacyStaff,
  });
  Some(next)
}

/// Append a staff-authored entry to the communication log.
///
/// Returns `None` for an empty or whitespace-only message; prior entries
/// are never removed or reordered.
pub fn append_log(
  current: &Subscription,
  message: &str,
  now: DateTime<Utc>,
) -> Option<Subscription> {
  let message = message.trim();
  if message.is_empty() {
    return None;
  }

  let mut next = current.clone();
  next.communication_log.push(LogEntry {
    date:    now,
    message: message.to_owned(),
    actor:   Actor::PharmacyStaff,
  });
  Some(next)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::subscription::{ActiveStatus, Duration, PhysicianStatus, Status};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 31, 10, 30, 0).unwrap()
  }

  fn input(name: &str) -> NewSubscription {
    NewSubscription {
      patient_name:     name.into(),
      duration:         Duration::ThreeMonths,
      status:           Status::default(),
      physician_status: PhysicianStatus::default(),
      new_rx_call:      true,
    }
  }

  fn subscription() -> Subscription {
    build_subscription(input("Ada Lovelace"), Uuid::new_v4(), now()).unwrap()
  }

  // ── build_subscription ────────────────────────────────────────────────────

  #[test]
  fn build_assembles_schedule_and_seed_log() {
    let sub = subscription();

    assert_eq!(sub.start_date, now());
    assert_eq!(sub.fulfillments.len(), 3);
    assert_eq!(sub.fulfillments[0].fulfillment_date, now());
    assert_eq!(sub.revision, 0);

    assert_eq!(sub.communication_log.len(), 1);
    let seed = &sub.communication_log[0];
    assert_eq!(seed.message, "Subscription created.");
    assert_eq!(seed.actor, Actor::System);
    assert_eq!(seed.date, now());
  }

  #[test]
  fn build_rejects_blank_patient_name() {
    let err = build_subscription(input("   "), Uuid::new_v4(), now());
    assert!(matches!(err, Err(Error::EmptyPatientName)));
  }

  // ── apply_edit ────────────────────────────────────────────────────────────

  #[test]
  fn edit_changes_only_editable_fields() {
    let sub = subscription();
    let edited = apply_edit(&sub, SubscriptionEdit {
      patient_name: Some("Ada King".into()),
      status:       Some(Status::OnHold),
      new_rx_call:  Some(false),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(edited.patient_name, "Ada King");
    assert_eq!(edited.status, Status::OnHold);
    assert!(!edited.new_rx_call);

    // Immutable core is preserved.
    assert_eq!(edited.subscription_id, sub.subscription_id);
    assert_eq!(edited.start_date, sub.start_date);
    assert_eq!(edited.duration, sub.duration);
    assert_eq!(edited.fulfillments, sub.fulfillments);
    assert_eq!(edited.communication_log, sub.communication_log);
  }

  #[test]
  fn empty_edit_is_identity() {
    let sub = subscription();
    let edited = apply_edit(&sub, SubscriptionEdit::default()).unwrap();
    assert_eq!(edited, sub);
  }

  #[test]
  fn edit_rejects_blank_patient_name() {
    let sub = subscription();
    let err = apply_edit(&sub, SubscriptionEdit {
      patient_name: Some("".into()),
      ..Default::default()
    });
    assert!(matches!(err, Err(Error::EmptyPatientName)));
  }

  // ── apply_shipment ────────────────────────────────────────────────────────

  #[test]
  fn shipment_marks_target_slot_only() {
    let sub = subscription();
    let shipped_at = now() + chrono::Duration::days(2);
    let next =
      apply_shipment(&sub, 1, Some("1Z999AA1".into()), shipped_at).unwrap();

    assert!(next.fulfillments[1].shipped);
    assert_eq!(next.fulfillments[1].tracking.as_deref(), Some("1Z999AA1"));

    // The other slots are untouched.
    assert_eq!(next.fulfillments[0], sub.fulfillments[0]);
    assert_eq!(next.fulfillments[2], sub.fulfillments[2]);
  }

  #[test]
  fn shipment_appends_exactly_one_staff_log_entry() {
    let sub = subscription();
    let next = apply_shipment(&sub, 0, Some("TRACK-7".into()), now()).unwrap();

    assert_eq!(next.communication_log.len(), sub.communication_log.len() + 1);
    let entry = next.communication_log.last().unwrap();
    assert_eq!(entry.actor, Actor::PharmacyStaff);
    assert!(entry.message.contains("2024-01-31"));
    assert!(entry.message.contains("TRACK-7"));
  }

  #[test]
  fn shipment_without_tracking_is_allowed() {
    let sub = subscription();
    let next = apply_shipment(&sub, 0, None, now()).unwrap();
    assert!(next.fulfillments[0].shipped);
    assert!(next.fulfillments[0].tracking.is_none());
    assert!(
      next
        .communication_log
        .last()
        .unwrap()
        .message
        .contains("No tracking number")
    );
  }

  #[test]
  fn shipment_of_unknown_slot_is_a_noop() {
    let sub = subscription();
    assert!(apply_shipment(&sub, 9, None, now()).is_none());
  }

  #[test]
  fn shipment_is_one_way() {
    let sub = subscription();
    let next = apply_shipment(&sub, 0, None, now()).unwrap();
    // Shipping the same slot again does nothing.
    assert!(apply_shipment(&next, 0, Some("late".into()), now()).is_none());
  }

  // ── append_log ────────────────────────────────────────────────────────────

  #[test]
  fn append_log_grows_by_one_and_preserves_history() {
    let sub = subscription();
    let next = append_log(&sub, "Left a voicemail.", now()).unwrap();

    assert_eq!(next.communication_log.len(), 2);
    assert_eq!(next.communication_log[0], sub.communication_log[0]);

    let entry = &next.communication_log[1];
    assert_eq!(entry.message, "Left a voicemail.");
    assert_eq!(entry.actor, Actor::PharmacyStaff);
  }

  #[test]
  fn append_log_rejects_whitespace_only() {
    let sub = subscription();
    assert!(append_log(&sub, "   \n", now()).is_none());
  }
}
