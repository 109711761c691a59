//! Status derivation — the read-time projection of a subscription's
//! authoritative display status.
//!
//! The stored status is never rewritten by derivation; the projection is
//! recomputed on every read and subscribe event, so stored and displayed
//! status cannot drift.

use serde::{Deserialize, Serialize};

use crate::subscription::{ActiveStatus, Fulfillment, Status, Subscription};

/// Compute the display status from the stored status and the fulfillment
/// schedule.
///
/// - `OnHold` is sticky and wins unconditionally.
/// - All slots shipped → `Fulfilled`.
/// - Only the final slot of a multi-month plan still unshipped →
///   `RenewalNeeded`. A one-month plan has no renewal concept and goes
///   straight from its stored status to `Fulfilled`.
/// - Otherwise the stored status passes through unchanged.
pub fn derive_status(stored: Status, fulfillments: &[Fulfillment]) -> Status {
  let Status::Active(_) = stored else {
    return Status::OnHold;
  };

  match fulfillments.iter().position(|f| !f.shipped) {
    None => Status::Active(ActiveStatus::Fulfilled),
    Some(next_unshipped)
      if next_unshipped + 1 == fulfillments.len() && fulfillments.len() > 1 =>
    {
      Status::Active(ActiveStatus::RenewalNeeded)
    }
    Some(_) => stored,
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A subscription bundled with its derived display status — the read model
/// handed to every consumer of the store. Never persisted, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionView {
  pub subscription:   Subscription,
  pub display_status: Status,
}

impl SubscriptionView {
  /// Project a raw stored record into the read model.
  pub fn project(subscription: Subscription) -> Self {
    let display_status =
      derive_status(subscription.status, &subscription.fulfillments);
    Self { subscription, display_status }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{schedule::generate_schedule, subscription::Duration};

  fn slots(shipped: &[bool]) -> Vec<Fulfillment> {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let duration = match shipped.len() {
      1 => Duration::OneMonth,
      3 => Duration::ThreeMonths,
      6 => Duration::SixMonths,
      n => panic!("no duration with {n} months"),
    };
    let mut fulfillments = generate_schedule(start, duration).unwrap();
    for (f, &s) in fulfillments.iter_mut().zip(shipped) {
      f.shipped = s;
    }
    fulfillments
  }

  const PENDING: Status = Status::Active(ActiveStatus::Pending);
  const APPROVED: Status = Status::Active(ActiveStatus::Approved);

  #[test]
  fn on_hold_is_sticky_over_everything() {
    assert_eq!(derive_status(Status::OnHold, &slots(&[false])), Status::OnHold);
    assert_eq!(
      derive_status(Status::OnHold, &slots(&[true, true, true])),
      Status::OnHold
    );
    assert_eq!(
      derive_status(Status::OnHold, &slots(&[true, true, false])),
      Status::OnHold
    );
  }

  #[test]
  fn all_shipped_derives_fulfilled() {
    for stored in [PENDING, APPROVED] {
      assert_eq!(
        derive_status(stored, &slots(&[true, true, true])),
        Status::Active(ActiveStatus::Fulfilled)
      );
    }
  }

  #[test]
  fn single_month_plan_never_needs_renewal() {
    assert_eq!(derive_status(PENDING, &slots(&[false])), PENDING);
    assert_eq!(
      derive_status(PENDING, &slots(&[true])),
      Status::Active(ActiveStatus::Fulfilled)
    );
  }

  #[test]
  fn final_pending_slot_derives_renewal_needed() {
    assert_eq!(
      derive_status(PENDING, &slots(&[true, true, false])),
      Status::Active(ActiveStatus::RenewalNeeded)
    );
    assert_eq!(
      derive_status(
        APPROVED,
        &slots(&[true, true, true, true, true, false])
      ),
      Status::Active(ActiveStatus::RenewalNeeded)
    );
  }

  #[test]
  fn mid_cycle_passes_stored_status_through() {
    assert_eq!(derive_status(PENDING, &slots(&[true, false, false])), PENDING);
    assert_eq!(derive_status(APPROVED, &slots(&[false, false, false])), APPROVED);
  }

  #[test]
  fn derivation_is_idempotent() {
    let fulfillments = slots(&[true, false, false]);
    let once = derive_status(PENDING, &fulfillments);
    let twice = derive_status(once, &fulfillments);
    assert_eq!(once, twice);
  }

  #[test]
  fn projection_keeps_stored_status_untouched() {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let sub = crate::ops::build_subscription(
      crate::subscription::NewSubscription {
        patient_name:     "Ada".into(),
        duration:         Duration::ThreeMonths,
        status:           PENDING,
        physician_status: Default::default(),
        new_rx_call:      false,
      },
      uuid::Uuid::new_v4(),
      start,
    )
    .unwrap();

    let mut sub = sub;
    for f in &mut sub.fulfillments {
      f.shipped = true;
    }

    let view = SubscriptionView::project(sub.clone());
    assert_eq!(view.display_status, Status::Active(ActiveStatus::Fulfilled));
    assert_eq!(view.subscription.status, PENDING);
  }
}
