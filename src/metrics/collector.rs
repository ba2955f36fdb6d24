//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the booking service using
//! Prometheus metrics.

use crate::error::BookingError;
use crate::types::{BookingStatus, BookingType};
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the booking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Booking lifecycle metrics
    booking_metrics: BookingMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,

    /// Login attempts by outcome
    pub logins_total: IntCounterVec,
}

/// Booking lifecycle metrics
#[derive(Clone)]
pub struct BookingMetrics {
    /// Bookings currently held by the store
    pub bookings_stored: IntGauge,

    /// Total bookings created, by type
    pub bookings_created_total: IntCounterVec,

    /// Total transitions applied, by target status
    pub transitions_total: IntCounterVec,

    /// Rejected operations, by operation and error kind
    pub failures_total: IntCounterVec,

    /// Re-evaluations after a lost compare-and-transition
    pub conflict_retries_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Lifecycle operation durations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let booking_metrics = BookingMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            booking_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get booking metrics
    pub fn booking(&self) -> &BookingMetrics {
        &self.booking_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a booking being created
    pub fn record_booking_created(&self, booking_type: BookingType) {
        self.booking_metrics
            .bookings_created_total
            .with_label_values(&[booking_type.as_str()])
            .inc();

        self.booking_metrics.bookings_stored.inc();
    }

    /// Record a successful transition into `status`
    pub fn record_transition(&self, status: BookingStatus) {
        self.booking_metrics
            .transitions_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    /// Record a rejected operation
    pub fn record_failure(&self, operation: &str, error: &BookingError) {
        self.booking_metrics
            .failures_total
            .with_label_values(&[operation, error.kind()])
            .inc();
    }

    /// Record a re-evaluation after a lost race
    pub fn record_conflict_retry(&self) {
        self.booking_metrics.conflict_retries_total.inc();
    }

    /// Record lifecycle operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record a login attempt
    pub fn record_login(&self, success: bool) {
        let outcome = if success { "success" } else { "rejected" };
        self.service_metrics
            .logins_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Overwrite the stored-bookings gauge from an authoritative count
    pub fn update_booking_count(&self, count: usize) {
        self.booking_metrics.bookings_stored.set(count as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("doovo_bookings_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "doovo_bookings_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("doovo_bookings_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        let logins_total = IntCounterVec::new(
            Opts::new("doovo_bookings_logins_total", "Login attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(logins_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
            logins_total,
        })
    }
}

impl BookingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let bookings_stored = IntGauge::new(
            "doovo_bookings_stored",
            "Bookings currently held by the store",
        )?;
        registry.register(Box::new(bookings_stored.clone()))?;

        let bookings_created_total = IntCounterVec::new(
            Opts::new("doovo_bookings_created_total", "Total bookings created"),
            &["booking_type"],
        )?;
        registry.register(Box::new(bookings_created_total.clone()))?;

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "doovo_bookings_transitions_total",
                "Total status transitions applied",
            ),
            &["status"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new(
                "doovo_bookings_failures_total",
                "Rejected booking operations",
            ),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let conflict_retries_total = IntCounter::new(
            "doovo_bookings_conflict_retries_total",
            "Status updates re-evaluated after a concurrent write",
        )?;
        registry.register(Box::new(conflict_retries_total.clone()))?;

        Ok(Self {
            bookings_stored,
            bookings_created_total,
            transitions_total,
            failures_total,
            conflict_retries_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "doovo_bookings_operation_duration_seconds",
                "Booking operation duration",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self { operation_duration })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        // Test that we can access all metric groups
        let _service = collector.service();
        let _booking = collector.booking();
        let _performance = collector.performance();
    }

    #[test]
    fn test_booking_counters() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_booking_created(BookingType::Dropoff);
        collector.record_booking_created(BookingType::PickupReturn);
        collector.record_transition(BookingStatus::Accepted);
        collector.record_conflict_retry();

        let booking = collector.booking();
        assert_eq!(booking.bookings_stored.get(), 2);
        assert_eq!(
            booking
                .bookings_created_total
                .with_label_values(&["dropoff"])
                .get(),
            1
        );
        assert_eq!(
            booking
                .transitions_total
                .with_label_values(&["accepted"])
                .get(),
            1
        );
        assert_eq!(booking.conflict_retries_total.get(), 1);

        collector.update_booking_count(10);
        assert_eq!(booking.bookings_stored.get(), 10);
    }

    #[test]
    fn test_failures_are_labelled_by_kind() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_failure("update_status", &BookingError::NotFound { id: 3 });
        collector.record_failure("update_status", &BookingError::NotFound { id: 4 });

        assert_eq!(
            collector
                .booking()
                .failures_total
                .with_label_values(&["update_status", "not_found"])
                .get(),
            2
        );
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2); // Healthy
        collector.update_component_health("booking_store", true);
        collector.record_login(false);

        assert_eq!(collector.service().health_status.get(), 2);
        assert_eq!(
            collector
                .service()
                .component_health
                .with_label_values(&["booking_store"])
                .get(),
            1
        );
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        collector.record_operation("create", final_duration);
        assert!(final_duration >= Duration::from_millis(10));
    }
}
