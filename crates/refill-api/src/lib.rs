//! JSON REST API for Refill.
//!
//! Exposes an axum [`Router`] backed by any
//! [`refill_core::store::SubscriptionStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", refill_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod subscriptions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use refill_core::store::SubscriptionStore;
use serde::Deserialize;

pub use error::ApiError;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: std::path::PathBuf,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SubscriptionStore + Clone + Send + Sync + 'static,
  S::Error: Into<ApiError> + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route(
      "/subscriptions/{id}",
      get(subscriptions::get_one::<S>)
        .patch(subscriptions::update_one::<S>)
        .delete(subscriptions::delete_one::<S>),
    )
    .route("/subscriptions/{id}/ship", post(subscriptions::ship_one::<S>))
    .route("/subscriptions/{id}/log", post(subscriptions::log_one::<S>))
    .with_state(store)
}
