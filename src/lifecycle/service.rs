//! Booking lifecycle service
//!
//! This is the only entry point that mutates bookings. It checks the caller's
//! capability, consults the transition policy, and applies the change through
//! the store's compare-and-transition. It holds no locks of its own.

use crate::error::{BookingError, Result};
use crate::lifecycle::access::{require_identity, require_worker};
use crate::lifecycle::policy::{evaluate, is_terminal, TransitionDecision};
use crate::metrics::MetricsCollector;
use crate::store::BookingStore;
use crate::types::{Booking, BookingId, BookingStatus, BookingType, Identity, NewBooking};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Re-evaluations allowed after the store reports a lost race
pub const CONFLICT_RETRY_LIMIT: u32 = 1;

/// The booking lifecycle service
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    metrics_collector: Arc<MetricsCollector>,
}

impl BookingService {
    /// Create a new booking service with its own metrics collector
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self::with_metrics(store, Arc::new(MetricsCollector::default()))
    }

    /// Create a new booking service reporting into `metrics_collector`
    pub fn with_metrics(
        store: Arc<dyn BookingStore>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            metrics_collector,
        }
    }

    /// Create a booking in `pending`, owned by the caller
    pub fn create_booking(
        &self,
        identity: Option<&Identity>,
        booking_type: BookingType,
    ) -> Result<Booking> {
        let timer = self.metrics_collector.start_timer();

        let result = require_identity(identity).and_then(|identity| {
            self.store.insert(NewBooking {
                booking_type,
                owner: identity.subject_id.clone(),
            })
        });

        match &result {
            Ok(booking) => {
                info!(
                    "Booking {} created - type: {}, owner: '{}'",
                    booking.id, booking.booking_type, booking.owner
                );
                self.metrics_collector.record_booking_created(booking_type);
            }
            Err(e) => {
                warn!("Booking creation rejected - type: {}, error: {}", booking_type, e);
                self.metrics_collector.record_failure("create", e);
            }
        }

        self.metrics_collector
            .record_operation("create", timer.stop());
        result
    }

    /// Advance a booking to `requested`, which must be its next status
    pub fn update_status(
        &self,
        identity: Option<&Identity>,
        booking_id: BookingId,
        requested: BookingStatus,
    ) -> Result<Booking> {
        let timer = self.metrics_collector.start_timer();

        let result = require_worker(identity)
            .and_then(|worker| self.advance(worker, booking_id, requested));

        match &result {
            Ok(booking) => {
                info!(
                    "Booking {} advanced to {} by '{}'",
                    booking.id,
                    booking.status,
                    identity.map_or("", |i| i.subject_id.as_str())
                );
                self.metrics_collector.record_transition(booking.status);
            }
            Err(e) => {
                let terminal = matches!(
                    e,
                    BookingError::InvalidTransition { current, .. } if is_terminal(*current)
                );
                warn!(
                    "Status update rejected - booking: {}, requested: {}, terminal: {}, error: {}",
                    booking_id, requested, terminal, e
                );
                self.metrics_collector.record_failure("update_status", e);
            }
        }

        self.metrics_collector
            .record_operation("update_status", timer.stop());
        result
    }

    /// All bookings in creation order; no role restriction
    pub fn list_bookings(&self, identity: Option<&Identity>) -> Result<Vec<Booking>> {
        let timer = self.metrics_collector.start_timer();
        let result = self.store.list_all();

        if let Ok(bookings) = &result {
            debug!(
                "Listed {} bookings for '{}'",
                bookings.len(),
                identity.map_or("anonymous", |i| i.subject_id.as_str())
            );
        }

        self.metrics_collector
            .record_operation("list", timer.stop());
        result
    }

    /// Look up a single booking
    pub fn get_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.store.get(booking_id)
    }

    /// Number of bookings held by the store
    pub fn booking_count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Read, decide, write; on a lost race, re-read and decide again
    fn advance(
        &self,
        worker: &Identity,
        booking_id: BookingId,
        requested: BookingStatus,
    ) -> Result<Booking> {
        let mut retries = 0;

        loop {
            let current = self.store.get(booking_id)?.status;

            if evaluate(current, requested) == TransitionDecision::Denied {
                return Err(BookingError::InvalidTransition { current, requested });
            }

            match self
                .store
                .compare_and_transition(booking_id, current, requested)
            {
                Err(BookingError::Conflict { .. }) if retries < CONFLICT_RETRY_LIMIT => {
                    retries += 1;
                    debug!(
                        "Booking {} changed under '{}', re-evaluating ({}/{})",
                        booking_id, worker.subject_id, retries, CONFLICT_RETRY_LIMIT
                    );
                    self.metrics_collector.record_conflict_retry();
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryBookingStore, MockBookingStore};
    use crate::utils::current_timestamp;

    fn service() -> BookingService {
        BookingService::new(Arc::new(InMemoryBookingStore::new()))
    }

    fn booking_with(id: BookingId, status: BookingStatus) -> Booking {
        let now = current_timestamp();
        Booking {
            id,
            booking_type: BookingType::Dropoff,
            status,
            owner: "c1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_booking_sets_owner_and_pending() {
        let service = service();
        let customer = Identity::customer("c1");

        let booking = service
            .create_booking(Some(&customer), BookingType::Dropoff)
            .unwrap();

        assert_eq!(booking.id, 1);
        assert_eq!(booking.booking_type, BookingType::Dropoff);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.owner, "c1");
    }

    #[test]
    fn test_create_booking_allows_any_role() {
        let service = service();
        let worker = Identity::worker("w1");

        let booking = service
            .create_booking(Some(&worker), BookingType::PickupReturn)
            .unwrap();
        assert_eq!(booking.owner, "w1");
    }

    #[test]
    fn test_create_booking_requires_identity() {
        let service = service();

        let err = service
            .create_booking(None, BookingType::Dropoff)
            .unwrap_err();
        assert_eq!(err, BookingError::Unauthenticated);
        assert_eq!(service.booking_count().unwrap(), 0);
    }

    #[test]
    fn test_walkthrough_with_skip_denied() {
        let service = service();
        let customer = Identity::customer("C1");
        let worker = Identity::worker("W1");

        let booking = service
            .create_booking(Some(&customer), BookingType::Dropoff)
            .unwrap();
        assert_eq!(booking.id, 1);

        let accepted = service
            .update_status(Some(&worker), 1, BookingStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.status, BookingStatus::Accepted);

        let err = service
            .update_status(Some(&worker), 1, BookingStatus::Washing)
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidTransition {
                current: BookingStatus::Accepted,
                requested: BookingStatus::Washing,
            }
        );
        assert_eq!(
            service.get_booking(1).unwrap().status,
            BookingStatus::Accepted
        );
    }

    #[test]
    fn test_full_chain_then_terminal() {
        let service = service();
        let worker = Identity::worker("w1");
        service
            .create_booking(Some(&Identity::customer("c1")), BookingType::Dropoff)
            .unwrap();

        for next in [
            BookingStatus::Accepted,
            BookingStatus::OnTheWay,
            BookingStatus::Washing,
            BookingStatus::Complete,
        ] {
            let booking = service.update_status(Some(&worker), 1, next).unwrap();
            assert_eq!(booking.status, next);
        }

        let err = service
            .update_status(Some(&worker), 1, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn test_update_requires_worker() {
        let service = service();
        let customer = Identity::customer("c1");
        service
            .create_booking(Some(&customer), BookingType::Dropoff)
            .unwrap();

        let err = service
            .update_status(Some(&customer), 1, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let err = service
            .update_status(None, 1, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        assert_eq!(
            service.get_booking(1).unwrap().status,
            BookingStatus::Pending
        );
    }

    #[test]
    fn test_forbidden_takes_precedence_over_not_found() {
        let service = service();
        let err = service
            .update_status(Some(&Identity::customer("c1")), 99, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[test]
    fn test_update_missing_booking() {
        let service = service();
        let err = service
            .update_status(Some(&Identity::worker("w1")), 99, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err, BookingError::NotFound { id: 99 });
    }

    #[test]
    fn test_list_bookings_is_unrestricted_and_ordered() {
        let service = service();
        let customer = Identity::customer("c1");
        for _ in 0..3 {
            service
                .create_booking(Some(&customer), BookingType::Dropoff)
                .unwrap();
        }
        service
            .update_status(Some(&Identity::worker("w1")), 2, BookingStatus::Accepted)
            .unwrap();

        let bookings = service.list_bookings(None).unwrap();
        let summary: Vec<_> = bookings.iter().map(|b| (b.id, b.status)).collect();
        assert_eq!(
            summary,
            vec![
                (1, BookingStatus::Pending),
                (2, BookingStatus::Accepted),
                (3, BookingStatus::Pending),
            ]
        );
    }

    #[test]
    fn test_conflict_is_retried_once_then_succeeds() {
        let mut store = MockBookingStore::new();
        let mut seq = mockall::Sequence::new();

        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(booking_with(id, BookingStatus::Accepted)));
        store
            .expect_compare_and_transition()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, _, _| Err(BookingError::Conflict { id }));
        // Second read still sees accepted, so the retried write goes through
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(booking_with(id, BookingStatus::Accepted)));
        store
            .expect_compare_and_transition()
            .withf(|_, expected, new| {
                *expected == BookingStatus::Accepted && *new == BookingStatus::OnTheWay
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, _, new| Ok(booking_with(id, new)));

        let service = BookingService::new(Arc::new(store));
        let booking = service
            .update_status(Some(&Identity::worker("w1")), 5, BookingStatus::OnTheWay)
            .unwrap();
        assert_eq!(booking.status, BookingStatus::OnTheWay);
    }

    #[test]
    fn test_retry_reevaluates_against_fresh_status() {
        let mut store = MockBookingStore::new();
        let mut seq = mockall::Sequence::new();

        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(booking_with(id, BookingStatus::Pending)));
        store
            .expect_compare_and_transition()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, _, _| Err(BookingError::Conflict { id }));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(booking_with(id, BookingStatus::Accepted)));

        let service = BookingService::new(Arc::new(store));
        let err = service
            .update_status(Some(&Identity::worker("w1")), 5, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidTransition {
                current: BookingStatus::Accepted,
                requested: BookingStatus::Accepted,
            }
        );
    }

    #[test]
    fn test_persistent_conflict_is_surfaced() {
        let mut store = MockBookingStore::new();
        store
            .expect_get()
            .times(2)
            .returning(|id| Ok(booking_with(id, BookingStatus::Pending)));
        store
            .expect_compare_and_transition()
            .times(2)
            .returning(|id, _, _| Err(BookingError::Conflict { id }));

        let service = BookingService::new(Arc::new(store));
        let err = service
            .update_status(Some(&Identity::worker("w1")), 5, BookingStatus::Accepted)
            .unwrap_err();
        assert_eq!(err, BookingError::Conflict { id: 5 });
        assert!(err.is_retryable());
    }
}
