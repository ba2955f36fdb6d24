//! Booking API routes
//!
//! Handlers are thin: they resolve the bearer token to an identity, parse
//! the body into typed values and hand both to [`BookingService`], which
//! owns the capability checks.
//!
//! [`BookingService`]: crate::lifecycle::BookingService

use crate::api::error::ApiError;
use crate::auth::{LoginRequest, Session};
use crate::error::BookingError;
use crate::metrics::{health_router, HealthServerState};
use crate::service::app::AppState;
use crate::types::{Booking, BookingId, CreateBookingRequest, Identity, UpdateStatusRequest};
use crate::utils::parse_bearer_token;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    routing::{patch, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::debug;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Full application router: booking API plus health and metrics endpoints
pub fn router(app_state: Arc<AppState>) -> Router {
    let health = health_router(
        HealthServerState::new(app_state.metrics_collector()).with_app_state(app_state.clone()),
    );

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/{id}/status", patch(update_status))
        .with_state(app_state)
        .merge(health)
}

/// Token from the `Authorization: Bearer` header, if well formed
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_bearer_token(value)
}

/// Identity behind the bearer token; resolver faults surface as errors
async fn caller_identity(
    app_state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<Option<Identity>> {
    match bearer_token(headers) {
        Some(token) => Ok(app_state.resolve_identity(token).await?),
        None => Ok(None),
    }
}

async fn login(
    State(app_state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Session>> {
    let Json(request) = body.map_err(|e| ApiError::invalid_body(e).at(uri.path()))?;

    let result = app_state.accounts().login(&request.email, &request.password);
    app_state.metrics_collector().record_login(result.is_ok());

    result
        .map(Json)
        .map_err(|e| ApiError::from(e).at(uri.path()))
}

async fn logout(
    State(app_state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::from(BookingError::Unauthenticated).at(uri.path()))?;

    match app_state.accounts().revoke(token) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::from(BookingError::Unauthenticated).at(uri.path())),
        Err(e) => Err(ApiError::from(e).at(uri.path())),
    }
}

async fn create_booking(
    State(app_state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let identity = caller_identity(&app_state, &headers)
        .await
        .map_err(|e| e.at(uri.path()))?;

    let booking = create_for(&app_state, identity.as_ref(), body)
        .map_err(|e| e.at(uri.path()))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

fn create_for(
    app_state: &AppState,
    identity: Option<&Identity>,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<Booking> {
    let Json(request) = body.map_err(ApiError::invalid_body)?;
    let booking_type = request.booking_type()?;

    Ok(app_state
        .booking_service()
        .create_booking(identity, booking_type)?)
}

async fn list_bookings(
    State(app_state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Booking>>> {
    let identity = caller_identity(&app_state, &headers)
        .await
        .map_err(|e| e.at(uri.path()))?;

    let bookings = app_state
        .booking_service()
        .list_bookings(identity.as_ref())
        .map_err(|e| ApiError::from(e).at(uri.path()))?;

    debug!("Returning {} bookings", bookings.len());
    Ok(Json(bookings))
}

async fn update_status(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let identity = caller_identity(&app_state, &headers)
        .await
        .map_err(|e| e.at(uri.path()))?;

    let booking = update_for(&app_state, identity.as_ref(), &raw_id, body)
        .map_err(|e| e.at(uri.path()))?;

    Ok(Json(booking))
}

/// The service checks the role before the booking lookup, so a customer
/// gets 403 even for a booking that does not exist
fn update_for(
    app_state: &AppState,
    identity: Option<&Identity>,
    raw_id: &str,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Booking> {
    let booking_id = parse_booking_id(raw_id)?;
    let Json(request) = body.map_err(ApiError::invalid_body)?;
    let status = request.status()?;

    Ok(app_state
        .booking_service()
        .update_status(identity, booking_id, status)?)
}

fn parse_booking_id(raw: &str) -> Result<BookingId, BookingError> {
    raw.parse().map_err(|_| BookingError::InvalidValue {
        field: "id",
        value: raw.to_string(),
    })
}
