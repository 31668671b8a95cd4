//! Request-scoped context and the aspect registry.
//!
//! A [`RequestContext`] is an immutable bag of request attributes threaded
//! through the middleware pipeline via request extensions. Stages derive a new
//! context with the `with_*` methods instead of mutating shared state, so one
//! request's enrichment can never leak into a concurrent one. The
//! [`AspectRegistry`] holds the named facts downstream code reads (identity,
//! workspace); it lives exactly as long as the request.
use std::{collections::HashMap, sync::Arc};

use crate::{
    core::{matcher::RouteMatch, route::Route},
    ports::{authenticator::Identity, localizer::Locale},
};

/// Aspect name under which the authenticated (or anonymous) user is published.
pub const USER_ASPECT: &str = "backend.user";
/// Aspect name under which the active workspace is published.
pub const WORKSPACE_ASPECT: &str = "workspace";
/// Well-known workspace used when an identity has no active workspace.
pub const LIVE_WORKSPACE: &str = "live";

/// Snapshot of the identity bound to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAspect {
    pub id: i64,
    pub username: String,
    pub authenticated: bool,
    pub admin: bool,
}

impl UserAspect {
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            username: String::new(),
            authenticated: false,
            admin: false,
        }
    }
}

impl From<&Identity> for UserAspect {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username.clone(),
            authenticated: identity.authenticated,
            admin: identity.admin,
        }
    }
}

/// The workspace the current identity operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceAspect {
    pub id: String,
}

impl WorkspaceAspect {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn live() -> Self {
        Self::new(LIVE_WORKSPACE)
    }

    pub fn is_live(&self) -> bool {
        self.id == LIVE_WORKSPACE
    }
}

/// A named, typed fact about the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aspect {
    User(UserAspect),
    Workspace(WorkspaceAspect),
}

/// Request-scoped key-value store of aspects. Keys are unique per request;
/// setting the same name twice is a programming error and is logged, with the
/// last write winning.
#[derive(Debug, Clone, Default)]
pub struct AspectRegistry {
    aspects: HashMap<String, Aspect>,
}

impl AspectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_aspect(&mut self, name: impl Into<String>, aspect: Aspect) {
        let name = name.into();
        if self.aspects.insert(name.clone(), aspect).is_some() {
            tracing::warn!(aspect = %name, "aspect set twice within one request");
        }
    }

    pub fn get_aspect(&self, name: &str) -> Option<&Aspect> {
        self.aspects.get(name)
    }

    /// Typed accessor for the `backend.user` aspect.
    pub fn user(&self) -> Option<&UserAspect> {
        match self.aspects.get(USER_ASPECT) {
            Some(Aspect::User(user)) => Some(user),
            _ => None,
        }
    }

    /// Typed accessor for the `workspace` aspect.
    pub fn workspace(&self) -> Option<&WorkspaceAspect> {
        match self.aspects.get(WORKSPACE_ASPECT) {
            Some(Aspect::Workspace(workspace)) => Some(workspace),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }
}

/// Immutable request-scoped attribute bag. Cheap to clone; every enrichment
/// step returns a derived copy.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    route: Option<Arc<Route>>,
    target: Option<String>,
    public: Option<bool>,
    path: Option<String>,
    params: Arc<HashMap<String, String>>,
    locale: Option<Locale>,
    aspects: Arc<AspectRegistry>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context carrying the matched route, its `target` option, the
    /// resolved `public` flag and the bound path variables.
    pub fn with_route_match(&self, matched: &RouteMatch) -> Self {
        let mut next = self.clone();
        next.target = Some(matched.route.target().to_string());
        next.public = Some(matched.route.access() == Some(crate::core::route::Access::Public));
        next.path = Some(matched.path.clone());
        next.params = Arc::new(matched.params.clone());
        next.route = Some(matched.route.clone());
        next
    }

    /// Derive a context carrying the resolved locale.
    pub fn with_locale(&self, locale: Locale) -> Self {
        let mut next = self.clone();
        next.locale = Some(locale);
        next
    }

    /// Derive a context carrying the published aspect registry.
    pub fn with_aspects(&self, aspects: AspectRegistry) -> Self {
        let mut next = self.clone();
        next.aspects = Arc::new(aspects);
        next
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The resolved `public` flag; false when no route was matched yet
    /// (fail-closed).
    pub fn is_public(&self) -> bool {
        self.public.unwrap_or(false)
    }

    /// The normalized request path the route was matched against.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn aspects(&self) -> &AspectRegistry {
        &self.aspects
    }
}
