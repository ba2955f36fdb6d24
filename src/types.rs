//! Common types used throughout the booking service

use crate::error::BookingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for bookings, assigned by the store starting at 1
pub type BookingId = u64;

/// Opaque subject identifier of an authenticated caller
pub type SubjectId = String;

/// Kind of service a booking requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Dropoff,
    PickupReturn,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Dropoff => "dropoff",
            BookingType::PickupReturn => "pickup_return",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dropoff" => Ok(BookingType::Dropoff),
            "pickup_return" => Ok(BookingType::PickupReturn),
            other => Err(BookingError::InvalidValue {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a booking
///
/// The legal ordering lives in [`crate::lifecycle::policy`]; this type only
/// names the states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    OnTheWay,
    Washing,
    Complete,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::OnTheWay => "on_the_way",
            BookingStatus::Washing => "washing",
            BookingStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "on_the_way" => Ok(BookingStatus::OnTheWay),
            "washing" => Ok(BookingStatus::Washing),
            "complete" => Ok(BookingStatus::Complete),
            other => Err(BookingError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Role carried by a resolved identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    #[serde(alias = "washer")]
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "worker" | "washer" => Ok(Role::Worker),
            other => Err(BookingError::InvalidValue {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Resolved caller identity, trusted verbatim by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: SubjectId,
    pub role: Role,
}

impl Identity {
    pub fn new(subject_id: impl Into<SubjectId>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }

    pub fn customer(subject_id: impl Into<SubjectId>) -> Self {
        Self::new(subject_id, Role::Customer)
    }

    pub fn worker(subject_id: impl Into<SubjectId>) -> Self {
        Self::new(subject_id, Role::Worker)
    }
}

/// A booking record as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub owner: SubjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record handed to the store; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub booking_type: BookingType,
    pub owner: SubjectId,
}

/// Body of a create-booking request, before enum validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(rename = "type")]
    pub booking_type: String,
}

impl CreateBookingRequest {
    pub fn booking_type(&self) -> crate::error::Result<BookingType> {
        self.booking_type.parse()
    }
}

/// Body of an update-status request, before enum validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn status(&self) -> crate::error::Result<BookingStatus> {
        self.status.parse()
    }
}
