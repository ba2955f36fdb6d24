//! Error types for the booking service
//!
//! Domain failures are typed values so callers can tell them apart without
//! string matching. Process-level plumbing (config, startup) uses anyhow.

use crate::types::{BookingId, BookingStatus};

/// Result type alias for booking operations
pub type Result<T> = std::result::Result<T, BookingError>;

/// Failure kinds surfaced by the booking core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Booking not found: {id}")]
    NotFound { id: BookingId },

    #[error("Invalid status transition from {current} → {requested}")]
    InvalidTransition {
        current: BookingStatus,
        requested: BookingStatus,
    },

    #[error("Booking {id} was modified concurrently, retry the request")]
    Conflict { id: BookingId },

    #[error("Invalid {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl BookingError {
    /// Stable machine-readable kind for responses and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Unauthenticated => "unauthenticated",
            BookingError::Forbidden { .. } => "forbidden",
            BookingError::NotFound { .. } => "not_found",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::Conflict { .. } => "conflict",
            BookingError::InvalidValue { .. } => "invalid_value",
            BookingError::Internal { .. } => "internal",
        }
    }

    /// Only a lost race is worth retrying at a higher level
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Conflict { .. })
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        BookingError::Internal {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
