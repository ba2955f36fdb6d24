//! Booking lifecycle: transition rules, capability checks, and the service
//! that orchestrates them against the store.

pub mod access;
pub mod policy;
pub mod service;

// Re-export commonly used types
pub use policy::{evaluate, successor, TransitionDecision, STATUS_CHAIN};
pub use service::{BookingService, CONFLICT_RETRY_LIMIT};
