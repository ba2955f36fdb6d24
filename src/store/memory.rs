//! In-memory booking store
//!
//! Records live in an append-only table indexed by `id - 1`. The table lock
//! is only held to allocate ids or to clone a record handle; each record has
//! its own mutex, so transitions on different bookings never wait on each
//! other while transitions on the same booking are strictly serialized.

use super::BookingStore;
use crate::error::{BookingError, Result};
use crate::types::{Booking, BookingId, BookingStatus, NewBooking};
use crate::utils::current_timestamp;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

type RecordHandle = Arc<Mutex<Booking>>;

#[derive(Debug)]
struct RecordTable {
    next_id: BookingId,
    records: Vec<RecordHandle>,
}

/// In-memory booking store implementation
#[derive(Debug)]
pub struct InMemoryBookingStore {
    table: RwLock<RecordTable>,
}

impl InMemoryBookingStore {
    /// Create an empty store; the first booking gets id 1
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty store with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RwLock::new(RecordTable {
                next_id: 1,
                records: Vec::with_capacity(capacity),
            }),
        }
    }

    fn handle(&self, id: BookingId) -> Result<RecordHandle> {
        let table = self
            .table
            .read()
            .map_err(|_| BookingError::lock_poisoned("booking table read"))?;

        let index = id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(BookingError::NotFound { id })?;

        table
            .records
            .get(index)
            .cloned()
            .ok_or(BookingError::NotFound { id })
    }

    fn snapshot(handle: &RecordHandle) -> Result<Booking> {
        handle
            .lock()
            .map(|record| record.clone())
            .map_err(|_| BookingError::lock_poisoned("booking record"))
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, record: NewBooking) -> Result<Booking> {
        let mut table = self
            .table
            .write()
            .map_err(|_| BookingError::lock_poisoned("booking table write"))?;

        let now = current_timestamp();
        let booking = Booking {
            id: table.next_id,
            booking_type: record.booking_type,
            status: BookingStatus::Pending,
            owner: record.owner,
            created_at: now,
            updated_at: now,
        };

        table.next_id += 1;
        table.records.push(Arc::new(Mutex::new(booking.clone())));

        debug!(
            "Stored booking {} (type: {}, owner: '{}')",
            booking.id, booking.booking_type, booking.owner
        );
        Ok(booking)
    }

    fn get(&self, id: BookingId) -> Result<Booking> {
        let handle = self.handle(id)?;
        Self::snapshot(&handle)
    }

    fn list_all(&self) -> Result<Vec<Booking>> {
        let handles: Vec<RecordHandle> = {
            let table = self
                .table
                .read()
                .map_err(|_| BookingError::lock_poisoned("booking table read"))?;
            table.records.clone()
        };

        handles.iter().map(Self::snapshot).collect()
    }

    fn compare_and_transition(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<Booking> {
        let handle = self.handle(id)?;
        let mut record = handle
            .lock()
            .map_err(|_| BookingError::lock_poisoned("booking record"))?;

        if record.status != expected {
            debug!(
                "Compare-and-transition lost on booking {}: expected {}, found {}",
                id, expected, record.status
            );
            return Err(BookingError::Conflict { id });
        }

        record.status = new_status;
        record.updated_at = current_timestamp();
        Ok(record.clone())
    }

    fn count(&self) -> Result<usize> {
        let table = self
            .table
            .read()
            .map_err(|_| BookingError::lock_poisoned("booking table read"))?;

        Ok(table.records.len())
    }
}
