//! Handlers for `/subscriptions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subscriptions` | All derived views |
//! | `POST`   | `/subscriptions` | Body: [`NewSubscription`]; returns 201 + stored record |
//! | `GET`    | `/subscriptions/{id}` | 404 if not found |
//! | `PATCH`  | `/subscriptions/{id}` | Editable fields only; 409 on stale revision |
//! | `DELETE` | `/subscriptions/{id}` | Irreversible; 204 on success |
//! | `POST`   | `/subscriptions/{id}/ship` | Body: [`ShipBody`] |
//! | `POST`   | `/subscriptions/{id}/log` | Body: [`LogBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use refill_core::{
  status::SubscriptionView,
  store::SubscriptionStore,
  subscription::{NewSubscription, Subscription, SubscriptionEdit},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subscriptions`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<SubscriptionView>>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let views = store.list().await.map_err(Into::into)?;
  Ok(Json(views))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions` — returns 201 + the stored record.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSubscription>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let subscription = store.create(body).await.map_err(Into::into)?;
  Ok((StatusCode::CREATED, Json(subscription)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionView>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let view = store
    .get(id)
    .await
    .map_err(Into::into)?
    .ok_or_else(|| ApiError::NotFound(format!("subscription {id} not found")))?;
  Ok(Json(view))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /subscriptions/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub edit:              SubscriptionEdit,
  /// If set, the write only lands when the stored revision still matches.
  pub expected_revision: Option<u64>,
}

/// `PATCH /subscriptions/{id}`
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let updated = store
    .update(id, body.edit, body.expected_revision)
    .await
    .map_err(Into::into)?
    .ok_or_else(|| ApiError::NotFound(format!("subscription {id} not found")))?;
  Ok(Json(updated))
}

// ─── Ship ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /subscriptions/{id}/ship`.
#[derive(Debug, Deserialize)]
pub struct ShipBody {
  /// Stable fulfillment slot assigned at creation.
  pub slot:              u32,
  pub tracking:          Option<String>,
  pub expected_revision: Option<u64>,
}

/// `POST /subscriptions/{id}/ship`
pub async fn ship_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ShipBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let updated = store
    .mark_shipped(id, body.slot, body.tracking, body.expected_revision)
    .await
    .map_err(Into::into)?
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "no unshipped fulfillment in slot {} for subscription {id}",
        body.slot
      ))
    })?;
  Ok(Json(updated))
}

// ─── Log ──────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /subscriptions/{id}/log`.
#[derive(Debug, Deserialize)]
pub struct LogBody {
  pub message:           String,
  pub expected_revision: Option<u64>,
}

/// `POST /subscriptions/{id}/log`
pub async fn log_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LogBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  if body.message.trim().is_empty() {
    return Err(ApiError::BadRequest("log message must not be empty".into()));
  }

  let updated = store
    .append_log(id, body.message, body.expected_revision)
    .await
    .map_err(Into::into)?
    .ok_or_else(|| ApiError::NotFound(format!("subscription {id} not found")))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subscriptions/{id}` — permanent and irreversible.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<ApiError>,
{
  let existed = store.delete(id).await.map_err(Into::into)?;
  if !existed {
    return Err(ApiError::NotFound(format!("subscription {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
