//! Port for the authentication collaborator.
use async_trait::async_trait;
use thiserror::Error;

/// Credentials extracted from the inbound request (session cookie or bearer
/// token). Absence of a token is not an error; it resolves to an anonymous
/// identity.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
        }
    }
}

/// Identity established for the current request. Opaque to the pipeline apart
/// from the fields needed to enforce access and publish aspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub authenticated: bool,
    pub admin: bool,
    /// Active workspace, if the user selected one.
    pub workspace: Option<String>,
    /// Preferred locale tag, if the user configured one.
    pub locale: Option<String>,
}

impl Identity {
    /// The identity used when no valid credentials are presented.
    pub fn anonymous() -> Self {
        Self {
            user_id: 0,
            username: String::new(),
            authenticated: false,
            admin: false,
            workspace: None,
            locale: None,
        }
    }
}

/// Error type for identity bootstrap failures. Covers only the case where the
/// collaborator cannot answer at all; invalid or missing credentials resolve
/// to an anonymous identity instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AuthError {
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Authenticator defines the port for establishing a per-request identity.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Establish the identity for the presented credentials.
    ///
    /// Must be idempotent for the same credentials within a request: resolving
    /// twice yields the same identity, never a duplicate session. May perform
    /// blocking I/O (session store lookup); the gate awaits completion before
    /// enforcing access.
    async fn resolve_identity(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}
