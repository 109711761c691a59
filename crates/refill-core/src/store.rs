//! The `SubscriptionStore` trait — the narrow interface the core uses to
//! reach durable storage.
//!
//! The trait is implemented by storage backends (e.g.
//! `refill-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend. All reads return [`SubscriptionView`]s so the
//! status derivation is applied at every read boundary; raw stored records
//! never leave the store.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  status::SubscriptionView,
  subscription::{NewSubscription, Subscription, SubscriptionEdit},
};

/// Abstraction over a subscription store backend.
///
/// Mutations are read-modify-write against the last persisted record.
/// `update`, `mark_shipped`, and `append_log` accept an optional expected
/// revision; when supplied, the write only lands if the stored revision
/// still matches, which closes the lost-update window between two
/// concurrent callers. Mutations against an unknown id resolve to
/// `Ok(None)` rather than an error: stale callers degrade to a no-op.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Assemble and persist a new subscription. The store assigns the id and
  /// the start date and seeds the communication log.
  fn create(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Retrieve one subscription by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SubscriptionView>, Self::Error>>
  + Send
  + '_;

  /// List all subscriptions in creation order.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<SubscriptionView>, Self::Error>> + Send + '_;

  /// Apply an edit to the editable fields. Immutable fields (start date,
  /// duration, schedule, log) are preserved regardless of input.
  fn update(
    &self,
    id: Uuid,
    edit: SubscriptionEdit,
    expected_revision: Option<u64>,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Mark one fulfillment slot shipped with an optional tracking number,
  /// appending the shipment to the communication log in the same write.
  /// `Ok(None)` if the record, the slot, or an unshipped transition no
  /// longer exists.
  fn mark_shipped(
    &self,
    id: Uuid,
    slot: u32,
    tracking: Option<String>,
    expected_revision: Option<u64>,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Append a staff log entry. `Ok(None)` if the record is gone or the
  /// message is blank.
  fn append_log(
    &self,
    id: Uuid,
    message: String,
    expected_revision: Option<u64>,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Permanently remove a subscription. Returns whether a record existed.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Subscribe to the change feed. Each message is a full, authoritative
  /// snapshot of the derived collection; consumers replace prior state
  /// wholesale. Dropping the receiver unsubscribes.
  fn watch(&self) -> watch::Receiver<Vec<SubscriptionView>>;
}
