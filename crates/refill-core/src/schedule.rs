//! Fulfillment scheduler.
//!
//! Builds the monthly shipment schedule for a new subscription. Called
//! exactly once per subscription: the duration is immutable, so there is no
//! reschedule operation.

use chrono::{DateTime, Months, Utc};

use crate::{
  Error, Result,
  subscription::{Duration, Fulfillment},
};

/// Produce the ordered fulfillment schedule for a subscription starting at
/// `start_date`.
///
/// Slot `i` falls on `start_date + i` calendar months, with all entries
/// unshipped and untracked. Month addition keeps the day-of-month and
/// clamps to the last valid day when the target month is shorter
/// (2024-01-31 + 1 month = 2024-02-29).
///
/// Pure and deterministic; errors only if the date arithmetic leaves
/// chrono's representable range.
pub fn generate_schedule(
  start_date: DateTime<Utc>,
  duration: Duration,
) -> Result<Vec<Fulfillment>> {
  (0..duration.months())
    .map(|slot| {
      let fulfillment_date = start_date
        .checked_add_months(Months::new(slot))
        .ok_or(Error::ScheduleOverflow)?;
      Ok(Fulfillment {
        slot,
        fulfillment_date,
        shipped: false,
        tracking: None,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  #[test]
  fn schedule_length_matches_duration() {
    let start = utc(2024, 3, 15);
    for (duration, n) in [
      (Duration::OneMonth, 1),
      (Duration::ThreeMonths, 3),
      (Duration::SixMonths, 6),
    ] {
      let schedule = generate_schedule(start, duration).unwrap();
      assert_eq!(schedule.len(), n);
    }
  }

  #[test]
  fn slots_are_sequential_and_unshipped() {
    let start = utc(2024, 3, 15);
    let schedule = generate_schedule(start, Duration::SixMonths).unwrap();

    for (i, f) in schedule.iter().enumerate() {
      assert_eq!(f.slot, i as u32);
      assert!(!f.shipped);
      assert!(f.tracking.is_none());
    }
  }

  #[test]
  fn dates_advance_by_one_calendar_month() {
    let start = utc(2024, 3, 15);
    let schedule = generate_schedule(start, Duration::ThreeMonths).unwrap();

    assert_eq!(schedule[0].fulfillment_date, start);
    assert_eq!(schedule[1].fulfillment_date, utc(2024, 4, 15));
    assert_eq!(schedule[2].fulfillment_date, utc(2024, 5, 15));
  }

  #[test]
  fn first_slot_is_the_start_date_itself() {
    let start = utc(2025, 11, 1);
    let schedule = generate_schedule(start, Duration::OneMonth).unwrap();
    assert_eq!(schedule[0].fulfillment_date, start);
  }

  #[test]
  fn month_end_clamps_to_shorter_months() {
    // Jan 31 start, leap year: Feb clamps to 29, then the day-of-month
    // stays at the clamped-from original only where valid.
    let start = utc(2024, 1, 31);
    let schedule = generate_schedule(start, Duration::SixMonths).unwrap();

    let dates: Vec<_> = schedule
      .iter()
      .map(|f| f.fulfillment_date)
      .collect();

    assert_eq!(dates[0], utc(2024, 1, 31));
    assert_eq!(dates[1], utc(2024, 2, 29));
    assert_eq!(dates[2], utc(2024, 3, 31));
    assert_eq!(dates[3], utc(2024, 4, 30));
    assert_eq!(dates[4], utc(2024, 5, 31));
    assert_eq!(dates[5], utc(2024, 6, 30));
  }

  #[test]
  fn dates_are_strictly_increasing() {
    let start = utc(2023, 12, 31);
    let schedule = generate_schedule(start, Duration::SixMonths).unwrap();

    for pair in schedule.windows(2) {
      assert!(pair[0].fulfillment_date < pair[1].fulfillment_date);
    }
  }

  #[test]
  fn deterministic_for_identical_inputs() {
    let start = utc(2024, 7, 4);
    let a = generate_schedule(start, Duration::ThreeMonths).unwrap();
    let b = generate_schedule(start, Duration::ThreeMonths).unwrap();
    assert_eq!(a, b);
  }
}
