//! Doovo Bookings - laundry booking lifecycle service
//!
//! This crate provides the booking lifecycle state machine, a
//! concurrency-safe in-memory booking store, and the HTTP service that
//! exposes them to customers and workers.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{BookingError, Result};
pub use types::*;

// Re-export key components
pub use auth::{AccountDirectory, IdentityResolver, StaticIdentityResolver};
pub use lifecycle::BookingService;
pub use store::{BookingStore, InMemoryBookingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
