//! Test fixtures and store wrappers for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use doovo_bookings::auth::{AccountDirectory, AuthError, IdentityResolver, StaticIdentityResolver};
use doovo_bookings::config::AppConfig;
use doovo_bookings::error::{BookingError, Result};
use doovo_bookings::service::AppState;
use doovo_bookings::store::{BookingStore, InMemoryBookingStore};
use doovo_bookings::types::{Booking, BookingId, BookingStatus, Identity, NewBooking};
use doovo_bookings::BookingService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const CUSTOMER_TOKEN: &str = "customer-token";
pub const WORKER_TOKEN: &str = "worker-token";

pub fn customer() -> Identity {
    Identity::customer("customer-1")
}

pub fn worker() -> Identity {
    Identity::worker("worker-1")
}

/// Store wrapper that counts calls and can lose a number of races on purpose
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryBookingStore,
    inserts: AtomicUsize,
    gets: AtomicUsize,
    transitions: AtomicUsize,
    forced_conflicts: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` compare-and-transition calls report `Conflict` without
    /// touching the record
    pub fn with_forced_conflicts(n: usize) -> Self {
        let store = Self::default();
        store.forced_conflicts.store(n, Ordering::SeqCst);
        store
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn transition_calls(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    pub fn total_mutating_calls(&self) -> usize {
        self.insert_calls() + self.transition_calls()
    }
}

impl BookingStore for RecordingStore {
    fn insert(&self, record: NewBooking) -> Result<Booking> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record)
    }

    fn get(&self, id: BookingId) -> Result<Booking> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id)
    }

    fn list_all(&self) -> Result<Vec<Booking>> {
        self.inner.list_all()
    }

    fn compare_and_transition(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<Booking> {
        self.transitions.fetch_add(1, Ordering::SeqCst);

        let lose = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lose {
            return Err(BookingError::Conflict { id });
        }

        self.inner.compare_and_transition(id, expected, new_status)
    }

    fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}

/// Service over a fresh in-memory store
pub fn create_test_service() -> BookingService {
    BookingService::new(Arc::new(InMemoryBookingStore::new()))
}

/// Service over a recording store, with the store handle for assertions
pub fn create_recording_service(store: RecordingStore) -> (BookingService, Arc<RecordingStore>) {
    let store = Arc::new(store);
    let service = BookingService::new(store.clone());
    (service, store)
}

/// Application state with fixed bearer tokens for one customer and one worker
pub fn create_test_app_state() -> Arc<AppState> {
    let config = AppConfig::default();
    let accounts = Arc::new(AccountDirectory::new(&config.auth.accounts));
    let resolver: Arc<dyn IdentityResolver> = Arc::new(StaticIdentityResolver::with_tokens(vec![
        (CUSTOMER_TOKEN.to_string(), customer()),
        (WORKER_TOKEN.to_string(), worker()),
    ]));

    let state = AppState::with_components(
        config,
        Arc::new(InMemoryBookingStore::new()),
        accounts,
        resolver,
    )
    .expect("test app state");

    Arc::new(state)
}

/// Application state that resolves tokens through the account directory
pub async fn create_login_app_state() -> Arc<AppState> {
    Arc::new(
        AppState::new(AppConfig::default())
            .await
            .expect("test app state"),
    )
}

/// Resolver whose backing session table is unavailable
pub struct UnavailableResolver;

#[async_trait]
impl IdentityResolver for UnavailableResolver {
    async fn resolve(&self, _token: &str) -> std::result::Result<Option<Identity>, AuthError> {
        Err(AuthError::Internal {
            message: "session table unavailable".to_string(),
        })
    }
}

/// Application state whose identity resolver always fails
pub fn create_unavailable_resolver_app_state() -> Arc<AppState> {
    let config = AppConfig::default();
    let accounts = Arc::new(AccountDirectory::new(&config.auth.accounts));

    let state = AppState::with_components(
        config,
        Arc::new(InMemoryBookingStore::new()),
        accounts,
        Arc::new(UnavailableResolver),
    )
    .expect("test app state");

    Arc::new(state)
}
