//! SQLite implementation of
//! [`SubscriptionStore`](refill_core::store::SubscriptionStore).

pub mod encode;
pub mod error;
pub mod schema;
pub mod store;


pub use error::{Error, Result};
pub use store::SqliteStore;
