//! In-process session store implementing the [`Authenticator`] port.
//!
//! Sessions are keyed by opaque UUID tokens handed out at login. Lookups are
//! read-only: resolving an identity never creates or mutates a session, which
//! is what makes the gate's bootstrap idempotent within a request. A missing
//! or expired token resolves to the anonymous identity; only an unusable
//! store is an error.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, header};
use scc::HashMap;

use crate::ports::authenticator::{AuthError, Authenticator, Credentials, Identity};

/// Extract session credentials from request headers: the session cookie
/// first, falling back to a bearer token.
pub fn extract_credentials(headers: &HeaderMap, cookie_name: &str) -> Credentials {
    if let Some(token) = cookie_value(headers, cookie_name) {
        return Credentials::from_token(token);
    }

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Credentials::from_token(token),
        None => Credentials::anonymous(),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .next()
}

/// Stored state of one authenticated session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i64,
    pub username: String,
    pub admin: bool,
    pub workspace: Option<String>,
    pub locale: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Concurrent in-process session store.
pub struct SessionStore {
    sessions: HashMap<String, SessionRecord>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(lifetime_secs: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            lifetime: Duration::seconds(lifetime_secs as i64),
        }
    }

    /// Open a session for a verified user and return its opaque token.
    /// Credential verification happens before this call, at the identity
    /// provider; the store only keeps the result.
    pub async fn open_session(
        &self,
        user_id: i64,
        username: impl Into<String>,
        admin: bool,
        workspace: Option<String>,
        locale: Option<String>,
    ) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let record = SessionRecord {
            user_id,
            username: username.into(),
            admin,
            workspace,
            locale,
            expires_at: Utc::now() + self.lifetime,
        };
        let _ = self.sessions.insert_async(token.clone(), record).await;
        tracing::debug!(user_id, "opened backend session");
        token
    }

    /// Close a session; unknown tokens are ignored.
    pub async fn close_session(&self, token: &str) {
        if self.sessions.remove_async(token).await.is_some() {
            tracing::debug!("closed backend session");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    async fn lookup(&self, token: &str) -> Option<SessionRecord> {
        let record = self
            .sessions
            .get_async(token)
            .await
            .map(|entry| entry.get().clone())?;

        if record.expires_at <= Utc::now() {
            self.sessions.remove_async(token).await;
            tracing::debug!(user_id = record.user_id, "evicted expired session");
            return None;
        }
        Some(record)
    }
}

#[async_trait]
impl Authenticator for SessionStore {
    async fn resolve_identity(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let Some(token) = credentials.session_token.as_deref() else {
            return Ok(Identity::anonymous());
        };

        match self.lookup(token).await {
            Some(record) => Ok(Identity {
                user_id: record.user_id,
                username: record.username,
                authenticated: true,
                admin: record.admin,
                workspace: record.workspace,
                locale: record.locale,
            }),
            None => Ok(Identity::anonymous()),
        }
    }
}
