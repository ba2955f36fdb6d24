//! HTTP error responses
//!
//! Bridges [`BookingError`] and [`AuthError`] into JSON error bodies with a
//! fixed status mapping.

use crate::auth::AuthError;
use crate::error::BookingError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, warn};

/// Error returned by API handlers
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    path: String,
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub status_code: u16,
    pub kind: String,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            path: String::new(),
        }
    }

    /// Malformed or incomplete request body
    pub fn invalid_body(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    }

    /// Attach the request path reported in the body
    pub fn at(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let status = match &err {
            BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::InvalidTransition { .. } | BookingError::InvalidValue { .. } => {
                StatusCode::BAD_REQUEST
            }
            BookingError::Conflict { .. } => StatusCode::CONFLICT,
            BookingError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                BookingError::Unauthenticated.kind(),
                err.to_string(),
            ),
            AuthError::Internal { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = %self.status,
                kind = self.kind,
                path = %self.path,
                "Request failed: {}",
                self.message
            );
        } else if self.status == StatusCode::CONFLICT {
            warn!(path = %self.path, "Request conflicted: {}", self.message);
        } else {
            debug!(
                status = %self.status,
                kind = self.kind,
                path = %self.path,
                "Request rejected: {}",
                self.message
            );
        }

        let body = ErrorBody {
            success: false,
            status_code: self.status.as_u16(),
            kind: self.kind.to_string(),
            message: self.message,
            path: self.path,
            timestamp: Utc::now(),
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookingStatus;

    #[test]
    fn test_booking_error_status_mapping() {
        let cases = [
            (BookingError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                BookingError::Forbidden {
                    reason: "worker role required".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (BookingError::NotFound { id: 9 }, StatusCode::NOT_FOUND),
            (
                BookingError::InvalidTransition {
                    current: BookingStatus::Accepted,
                    requested: BookingStatus::Washing,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BookingError::InvalidValue {
                    field: "status",
                    value: "done".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (BookingError::Conflict { id: 1 }, StatusCode::CONFLICT),
            (
                BookingError::Internal {
                    message: "poisoned".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let kind = err.kind();
            let api_error = ApiError::from(err);
            assert_eq!(api_error.status(), expected);
            assert_eq!(api_error.kind(), kind);
        }
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        let api_error = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(api_error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(api_error.kind(), "unauthenticated");
        assert_eq!(api_error.to_string(), "[unauthenticated] Invalid credentials");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::from(BookingError::NotFound { id: 42 })
            .at("/bookings/42/status")
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();

        assert!(!body.success);
        assert_eq!(body.status_code, 404);
        assert_eq!(body.kind, "not_found");
        assert_eq!(body.path, "/bookings/42/status");
        assert!(body.message.contains("42"));
    }
}
