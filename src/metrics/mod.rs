//! Metrics and monitoring for the booking service
//!
//! This module provides Prometheus metrics collection and the HTTP health
//! and metrics endpoints.

pub mod collector;
pub mod health;

pub use collector::{BookingMetrics, MetricsCollector, PerformanceMetrics, ServiceMetrics};
pub use health::{encode_metrics, health_router, HealthServerState};
