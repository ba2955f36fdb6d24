//! Account directory and session issuance
//!
//! Accounts come from configuration. A login is a plain equality check on
//! the configured password; a successful login issues an opaque session
//! token that the directory can later resolve back to an identity. Sessions
//! expire after the configured TTL and are removed by [`AccountDirectory::prune_expired`]
//! or on logout.

use crate::auth::resolver::IdentityResolver;
use crate::auth::AuthError;
use crate::config::AccountConfig;
use crate::types::{Identity, Role, SubjectId};
use crate::utils::generate_session_token;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Session lifetime when none is configured
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Public view of an account, without its password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub subject_id: SubjectId,
    pub email: String,
    pub role: Role,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: AccountSummary,
    pub access_token: String,
}

/// Body of a login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    identity: Identity,
    issued_at: Instant,
}

/// In-memory account directory
#[derive(Debug)]
pub struct AccountDirectory {
    accounts: HashMap<String, AccountConfig>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    session_ttl: Duration,
}

impl AccountDirectory {
    /// Create a directory from configured accounts, keyed by email
    pub fn new(accounts: &[AccountConfig]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|account| (account.email.clone(), account.clone()))
                .collect(),
            sessions: RwLock::new(HashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Set how long issued sessions stay valid
    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.issued_at) >= self.session_ttl
    }

    /// Check credentials and issue a session token
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = match self.accounts.get(email) {
            Some(account) if account.password == password => account,
            _ => {
                warn!("Login rejected for '{}'", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let access_token = generate_session_token();
        let entry = SessionEntry {
            identity: Identity::new(account.subject_id.clone(), account.role),
            issued_at: Instant::now(),
        };

        self.sessions
            .write()
            .map_err(|_| AuthError::Internal {
                message: "Failed to acquire sessions write lock".to_string(),
            })?
            .insert(access_token.clone(), entry);

        info!(
            "Session issued - subject: '{}', role: {}",
            account.subject_id, account.role
        );

        Ok(Session {
            user: AccountSummary {
                subject_id: account.subject_id.clone(),
                email: account.email.clone(),
                role: account.role,
            },
            access_token,
        })
    }

    /// Drop a session token; returns whether it existed
    pub fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let mut sessions = self.sessions.write().map_err(|_| AuthError::Internal {
            message: "Failed to acquire sessions write lock".to_string(),
        })?;

        let removed = sessions.remove(token).is_some();
        if removed {
            debug!("Session revoked");
        }
        Ok(removed)
    }

    /// Drop every expired session; returns how many were removed
    pub fn prune_expired(&self) -> Result<usize, AuthError> {
        let mut sessions = self.sessions.write().map_err(|_| AuthError::Internal {
            message: "Failed to acquire sessions write lock".to_string(),
        })?;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let pruned = before - sessions.len();

        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }
        Ok(pruned)
    }

    /// Number of configured accounts
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of stored sessions, including expired ones not yet pruned
    pub fn session_count(&self) -> Result<usize, AuthError> {
        self.sessions
            .read()
            .map(|sessions| sessions.len())
            .map_err(|_| AuthError::Internal {
                message: "Failed to acquire sessions read lock".to_string(),
            })
    }
}

#[async_trait]
impl IdentityResolver for AccountDirectory {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let sessions = self.sessions.read().map_err(|_| AuthError::Internal {
            message: "Failed to acquire sessions read lock".to_string(),
        })?;

        let now = Instant::now();
        let identity = sessions
            .get(token)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.identity.clone());
        debug!("Session lookup - known: {}", identity.is_some());
        Ok(identity)
    }
}
