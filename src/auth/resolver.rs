//! Identity resolution from bearer credentials
//!
//! The booking core never authenticates anyone itself; it trusts whatever
//! identity a resolver hands it.

use crate::auth::AuthError;
use crate::types::Identity;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Trait for turning a transport credential into a caller identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a bearer token; `Ok(None)` means the token is unknown
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError>;
}

/// Resolver backed by a fixed token table
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver from `(token, identity)` pairs
    pub fn with_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (String, Identity)>,
    {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Add a valid token
    pub fn add_token(&mut self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let identity = self.tokens.get(token).cloned();
        debug!("Static token lookup - known: {}", identity.is_some());
        Ok(identity)
    }
}
