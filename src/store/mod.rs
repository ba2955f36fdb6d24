//! Booking storage interface and implementations
//!
//! The store is the single shared mutable resource of the service. It owns
//! id assignment and all locking; callers only react to its results.

pub mod memory;

use crate::error::Result;
use crate::types::{Booking, BookingId, BookingStatus, NewBooking};

pub use memory::InMemoryBookingStore;

/// Trait for booking storage operations
#[cfg_attr(test, mockall::automock)]
pub trait BookingStore: Send + Sync {
    /// Assign the next unused id, store the record, return it
    fn insert(&self, record: NewBooking) -> Result<Booking>;

    /// Look up a single booking
    fn get(&self, id: BookingId) -> Result<Booking>;

    /// All bookings in insertion order
    fn list_all(&self) -> Result<Vec<Booking>>;

    /// Atomically move `id` from `expected` to `new_status`.
    ///
    /// Fails with `Conflict` if the stored status is no longer `expected`.
    fn compare_and_transition(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<Booking>;

    /// Number of stored bookings
    fn count(&self) -> Result<usize>;
}
