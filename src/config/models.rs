//! Configuration data structures for Atrium.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files.
//! They are intentionally serde-friendly and include defaults so that minimal
//! configs remain concise. The route list is ordered: registration order is
//! the tie-breaker during route matching.
use serde::{Deserialize, Serialize};

use crate::core::route::Access;

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_cookie_name() -> String {
    "atrium_session".to_string()
}

fn default_session_lifetime_secs() -> u64 {
    28_800
}

fn default_locale() -> String {
    "en".to_string()
}

/// One registered route: identifier, path pattern and declared options.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteEntry {
    /// Unique route identifier.
    pub id: String,
    /// Path pattern: literal segments, `{variable}` segments, optional
    /// `{*wildcard}` tail.
    pub path: String,
    /// Opaque handler reference invoked when the route matches.
    pub target: String,
    /// Access option; absent means an authenticated session is required.
    #[serde(default)]
    pub access: Option<Access>,
    /// HTTP methods the route responds to (empty = any).
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Session handling configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Session lifetime in seconds.
    pub lifetime_secs: u64,
    /// Locale used for identities without a configured one.
    pub default_locale: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            lifetime_secs: default_session_lifetime_secs(),
            default_locale: default_locale(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Path unauthenticated browser requests are redirected to.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl ServerConfig {
    /// Create a new server configuration builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            login_path: default_login_path(),
            session: SessionConfig::default(),
            routes: Vec::new(),
        }
    }
}

/// Builder for [`ServerConfig`] to allow for cleaner configuration creation
/// in tests and embedding code.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    listen_addr: Option<String>,
    login_path: Option<String>,
    session: Option<SessionConfig>,
    routes: Vec<RouteEntry>,
}

impl ServerConfigBuilder {
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// Append a route; registration order is preserved.
    pub fn route(mut self, entry: RouteEntry) -> Self {
        self.routes.push(entry);
        self
    }

    pub fn build(self) -> Result<ServerConfig, String> {
        if self.routes.is_empty() {
            return Err("at least one route must be configured".to_string());
        }

        Ok(ServerConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            login_path: self.login_path.unwrap_or_else(default_login_path),
            session: self.session.unwrap_or_default(),
            routes: self.routes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.session.cookie_name, "atrium_session");
        assert!(config.routes.is_empty());
    }

    #[test]
    fn builder_requires_routes() {
        assert!(ServerConfig::builder().build().is_err());

        let config = ServerConfig::builder()
            .listen_addr("0.0.0.0:9000")
            .route(RouteEntry {
                id: "login".to_string(),
                path: "/login".to_string(),
                target: "login".to_string(),
                access: Some(Access::Public),
                methods: vec![],
            })
            .build()
            .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn route_entry_access_deserializes_lowercase() {
        let entry: RouteEntry = serde_json::from_str(
            r#"{"id": "login", "path": "/login", "target": "login", "access": "public"}"#,
        )
        .unwrap();
        assert_eq!(entry.access, Some(Access::Public));

        let entry: RouteEntry =
            serde_json::from_str(r#"{"id": "m", "path": "/modules/{module}", "target": "module"}"#)
                .unwrap();
        assert_eq!(entry.access, None);
        assert!(entry.methods.is_empty());
    }
}
