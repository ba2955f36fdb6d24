//! Caller authentication
//!
//! Resolves bearer tokens to identities and issues session tokens for the
//! configured accounts. Kept outside the booking core, which only consumes
//! the resulting [`crate::types::Identity`].

pub mod directory;
pub mod resolver;

pub use directory::{AccountDirectory, AccountSummary, LoginRequest, Session};
pub use resolver::{IdentityResolver, StaticIdentityResolver};

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal authentication error: {message}")]
    Internal { message: String },
}
