//! [`SqliteStore`] — the SQLite implementation of [`SubscriptionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use refill_core::{
  ops,
  status::SubscriptionView,
  store::SubscriptionStore,
  subscription::{NewSubscription, Subscription, SubscriptionEdit},
};

use crate::{
  Error, Result,
  encode::{
    RawSubscription, encode_dt, encode_duration, encode_fulfillments,
    encode_log, encode_physician_status, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const SELECT_COLUMNS: &str = "subscription_id, patient_name, new_rx_call, \
   duration_months, start_date, status, physician_status, fulfillments, \
   communication_log, revision";

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubscription> {
  Ok(RawSubscription {
    subscription_id:   row.get(0)?,
    patient_name:      row.get(1)?,
    new_rx_call:       row.get(2)?,
    duration_months:   row.get(3)?,
    start_date:        row.get(4)?,
    status:            row.get(5)?,
    physician_status:  row.get(6)?,
    fulfillments:      row.get(7)?,
    communication_log: row.get(8)?,
    revision:          row.get(9)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Refill subscription store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and clones
/// share one change feed. Every successful mutation publishes a fresh
/// full-collection snapshot of derived views to [`SqliteStore::watch`]
/// receivers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: watch::Sender<Vec<SubscriptionView>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (feed, _) = watch::channel(Vec::new());
    let store = Self { conn, feed };
    store
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    store.publish().await?;
    Ok(store)
  }

  /// Read the stored record for `id`, unprojected.
  async fn fetch(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SELECT_COLUMNS} FROM subscriptions \
                 WHERE subscription_id = ?1"
              ),
              rusqlite::params![id_str],
              read_raw,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  /// Read every stored record in creation order.
  async fn fetch_all(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SELECT_COLUMNS} FROM subscriptions \
           ORDER BY start_date, subscription_id"
        ))?;
        let rows = stmt
          .query_map([], read_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawSubscription::into_subscription)
      .collect()
  }

  /// Push a fresh full-collection snapshot into the change feed.
  async fn publish(&self) -> Result<()> {
    let views = self
      .fetch_all()
      .await?
      .into_iter()
      .map(SubscriptionView::project)
      .collect();
    self.feed.send_replace(views);
    Ok(())
  }

  /// Write `next` over the row it replaces, conditional on the stored
  /// revision still being `base_revision`. Returns whether the write
  /// landed. All mutable fields are replaced whole.
  async fn persist_replacement(
    &self,
    next: &Subscription,
    base_revision: u64,
  ) -> Result<bool> {
    let id_str            = encode_uuid(next.subscription_id);
    let patient_name      = next.patient_name.clone();
    let new_rx_call       = next.new_rx_call;
    let status_str        = encode_status(next.status).to_owned();
    let physician_str     = encode_physician_status(next.physician_status).to_owned();
    let fulfillments_str  = encode_fulfillments(&next.fulfillments)?;
    let log_str           = encode_log(&next.communication_log)?;
    let revision          = next.revision as i64;
    let base_revision_i64 = base_revision as i64;

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions SET
             patient_name = ?2, new_rx_call = ?3, status = ?4,
             physician_status = ?5, fulfillments = ?6,
             communication_log = ?7, revision = ?8
           WHERE subscription_id = ?1 AND revision = ?9",
          rusqlite::params![
            id_str,
            patient_name,
            new_rx_call,
            status_str,
            physician_str,
            fulfillments_str,
            log_str,
            revision,
            base_revision_i64,
          ],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  /// Shared tail of the read-modify-write cycle: check the caller's
  /// expected revision, bump, write conditionally, publish.
  ///
  /// `Ok(None)` when the row was deleted between the read and the write;
  /// `RevisionConflict` when it was rewritten.
  pub(crate) async fn commit(
    &self,
    current: Subscription,
    mut next: Subscription,
    expected_revision: Option<u64>,
  ) -> Result<Option<Subscription>> {
    if let Some(expected) = expected_revision
      && expected != current.revision
    {
      return Err(Error::RevisionConflict {
        expected,
        actual: current.revision,
      });
    }

    next.revision = current.revision + 1;

    if !self.persist_replacement(&next, current.revision).await? {
      // The row changed or vanished between our read and the write.
      let Some(actual) =
        self.fetch(next.subscription_id).await?.map(|s| s.revision)
      else {
        return Ok(None);
      };
      return Err(Error::RevisionConflict {
        expected: current.revision,
        actual,
      });
    }

    self.publish().await?;
    Ok(Some(next))
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewSubscription) -> Result<Subscription> {
    let subscription =
      ops::build_subscription(input, Uuid::new_v4(), Utc::now())
        .map_err(Error::Core)?;

    let id_str           = encode_uuid(subscription.subscription_id);
    let patient_name     = subscription.patient_name.clone();
    let new_rx_call      = subscription.new_rx_call;
    let duration         = encode_duration(subscription.duration);
    let start_str        = encode_dt(subscription.start_date);
    let status_str       = encode_status(subscription.status).to_owned();
    let physician_str    =
      encode_physician_status(subscription.physician_status).to_owned();
    let fulfillments_str = encode_fulfillments(&subscription.fulfillments)?;
    let log_str          = encode_log(&subscription.communication_log)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             subscription_id, patient_name, new_rx_call, duration_months,
             start_date, status, physician_status, fulfillments,
             communication_log, revision
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
          rusqlite::params![
            id_str,
            patient_name,
            new_rx_call,
            duration,
            start_str,
            status_str,
            physician_str,
            fulfillments_str,
            log_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish().await?;
    Ok(subscription)
  }

  async fn get(&self, id: Uuid) -> Result<Option<SubscriptionView>> {
    Ok(self.fetch(id).await?.map(SubscriptionView::project))
  }

  async fn list(&self) -> Result<Vec<SubscriptionView>> {
    Ok(
      self
        .fetch_all()
        .await?
        .into_iter()
        .map(SubscriptionView::project)
        .collect(),
    )
  }

  async fn update(
    &self,
    id: Uuid,
    edit: SubscriptionEdit,
    expected_revision: Option<u64>,
  ) -> Result<Option<Subscription>> {
    let Some(current) = self.fetch(id).await? else {
      return Ok(None);
    };

    let next = ops::apply_edit(&current, edit).map_err(Error::Core)?;
    self.commit(current, next, expected_revision).await
  }

  async fn mark_shipped(
    &self,
    id: Uuid,
    slot: u32,
    tracking: Option<String>,
    expected_revision: Option<u64>,
  ) -> Result<Option<Subscription>> {
    let Some(current) = self.fetch(id).await? else {
      return Ok(None);
    };

    let Some(next) = ops::apply_shipment(&current, slot, tracking, Utc::now())
    else {
      // Unknown or already-shipped slot: stale caller, no write.
      return Ok(None);
    };

    self.commit(current, next, expected_revision).await
  }

  async fn append_log(
    &self,
    id: Uuid,
    message: String,
    expected_revision: Option<u64>,
  ) -> Result<Option<Subscription>> {
    let Some(current) = self.fetch(id).await? else {
      return Ok(None);
    };

    let Some(next) = ops::append_log(&current, &message, Utc::now()) else {
      return Ok(None);
    };

    self.commit(current, next, expected_revision).await
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE subscription_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if rows > 0 {
      self.publish().await?;
    }
    Ok(rows > 0)
  }

  fn watch(&self) -> watch::Receiver<Vec<SubscriptionView>> {
    self.feed.subscribe()
  }
}
