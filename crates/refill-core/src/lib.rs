//! Core types and trait definitions for the Refill subscription tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; the scheduler, status deriver, and
//! mutation transforms live here as pure functions.

pub mod error;
pub mod ops;
pub mod schedule;
pub mod status;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
