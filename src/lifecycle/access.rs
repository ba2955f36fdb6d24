//! Capability checks on the caller identity
//!
//! Identities arrive as explicit parameters; these helpers turn a missing or
//! under-privileged identity into the matching typed failure.

use crate::error::{BookingError, Result};
use crate::types::{Identity, Role};

/// Any resolved identity may create bookings
pub fn require_identity(identity: Option<&Identity>) -> Result<&Identity> {
    identity.ok_or(BookingError::Unauthenticated)
}

/// Status updates need the worker role; a missing identity is also refused
pub fn require_worker(identity: Option<&Identity>) -> Result<&Identity> {
    match identity {
        Some(identity) if identity.role == Role::Worker => Ok(identity),
        Some(identity) => Err(BookingError::Forbidden {
            reason: format!(
                "role '{}' cannot update booking status",
                identity.role
            ),
        }),
        None => Err(BookingError::Forbidden {
            reason: "status updates require a worker identity".to_string(),
        }),
    }
}
