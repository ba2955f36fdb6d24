//! HTTP surface of the booking service
//!
//! axum router, JSON error mapping and the server that serves them.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use server::{ApiServer, ApiServerConfig};
