//! Access policy evaluation for matched routes.
//!
//! The primary decision is option-based: a route is public iff it declares
//! `access = "public"`. A missing option means authentication is required
//! (fail-closed). The legacy allow-list branch below is kept strictly
//! separate so it can be deleted without touching the option logic.
use crate::{
    core::route::{Access, Route},
    metrics,
};

/// Literal paths treated as public even without the `access` option.
///
/// Deprecated: routes should declare `access = "public"` instead. Every match
/// against this list emits a deprecation signal; do not add entries.
pub const LEGACY_PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/login/frame",
    "/ajax/login",
    "/ajax/logout",
    "/ajax/login/refresh",
    "/ajax/login/timedout",
];

/// Decides whether a matched route is reachable without a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// True iff the route may be served without an authenticated session.
    pub fn is_public(&self, route: &Route) -> bool {
        if route.access() == Some(Access::Public) {
            return true;
        }
        self.is_legacy_public(route)
    }

    /// Deprecated allow-list branch, scheduled for removal.
    fn is_legacy_public(&self, route: &Route) -> bool {
        let path = route.pattern().as_str();
        if LEGACY_PUBLIC_PATHS.contains(&path) {
            metrics::increment_legacy_public_path(path);
            tracing::warn!(
                path,
                route = route.id(),
                "route allowed via deprecated public-path allow-list; declare access = \"public\" on the route instead"
            );
            return true;
        }
        false
    }
}
