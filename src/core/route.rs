//! Route definitions and the immutable route table.
//!
//! A [`Route`] binds a path pattern to a handler reference (`target`) plus
//! declared options such as the access level. Routes are constructed once at
//! startup from configuration and never change afterwards; the [`RouteTable`]
//! owns them behind `Arc` so concurrent request handling shares them without
//! synchronization.
use std::{collections::HashMap, sync::Arc};

use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::models::RouteEntry;

/// Declared access level of a route. Absence of the option means the route
/// requires an authenticated session (fail-closed).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Reachable without a session.
    Public,
    /// Requires any authenticated session.
    User,
    /// Requires an authenticated session with administrator rights.
    Admin,
}

/// Error produced while parsing a route path pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern must start with '/': '{0}'")]
    MissingLeadingSlash(String),
    #[error("empty variable name in segment of pattern '{0}'")]
    EmptyVariable(String),
    #[error("wildcard segment must be the last segment of pattern '{0}'")]
    WildcardNotLast(String),
    #[error("variable '{name}' declared twice in pattern '{pattern}'")]
    DuplicateVariable { pattern: String, name: String },
}

/// One segment of a parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Must match the request segment verbatim.
    Literal(String),
    /// `{name}` - binds exactly one non-empty request segment.
    Variable(String),
    /// `{*name}` - binds the non-empty remainder of the path.
    Wildcard(String),
}

/// A parsed route path pattern: literal segments, `{variable}` segments and an
/// optional `{*wildcard}` tail.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern string. The pattern must start with `/`; a wildcard
    /// segment is only allowed in tail position.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();
        let parts: Vec<&str> = raw
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if let Some(name) = inner.strip_prefix('*') {
                    if name.is_empty() {
                        return Err(PatternError::EmptyVariable(raw.to_string()));
                    }
                    if i + 1 != parts.len() {
                        return Err(PatternError::WildcardNotLast(raw.to_string()));
                    }
                    Segment::Wildcard(name.to_string())
                } else {
                    if inner.is_empty() {
                        return Err(PatternError::EmptyVariable(raw.to_string()));
                    }
                    Segment::Variable(inner.to_string())
                }
            } else {
                Segment::Literal(part.to_string())
            };

            if let Segment::Variable(name) | Segment::Wildcard(name) = &segment {
                if seen.contains(name) {
                    return Err(PatternError::DuplicateVariable {
                        pattern: raw.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(name.clone());
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern consists of literal segments only.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// True when the pattern ends in a wildcard tail.
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Ordering class used by the route table: literal patterns match before
    /// patterns with variables, which match before wildcard patterns.
    pub(crate) fn specificity_class(&self) -> u8 {
        if self.has_wildcard() {
            2
        } else if self.is_literal() {
            0
        } else {
            1
        }
    }

    /// Test a normalized request path against this pattern, binding variable
    /// segments positionally. Returns the bound variables on a match.
    pub fn bind(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut params = HashMap::new();
        let mut cursor = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(cursor) != Some(&lit.as_str()) {
                        return None;
                    }
                    cursor += 1;
                }
                Segment::Variable(name) => {
                    let value = parts.get(cursor)?;
                    params.insert(name.clone(), (*value).to_string());
                    cursor += 1;
                }
                Segment::Wildcard(name) => {
                    // Wildcard tail binds the (non-empty) remainder.
                    if cursor >= parts.len() {
                        return None;
                    }
                    params.insert(name.clone(), parts[cursor..].join("/"));
                    cursor = parts.len();
                }
            }
        }

        if cursor == parts.len() {
            Some(params)
        } else {
            None
        }
    }
}

/// A registered route: identifier, path pattern and declared options.
/// Immutable once constructed; owned by the [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Route {
    id: String,
    pattern: PathPattern,
    target: String,
    access: Option<Access>,
    methods: Vec<Method>,
}

impl Route {
    pub fn new(id: impl Into<String>, pattern: PathPattern, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern,
            target: target.into(),
            access: None,
            methods: Vec::new(),
        }
    }

    /// Declare the `access` option.
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    /// Restrict the route to the given HTTP methods (empty = any method).
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The opaque handler reference declared as the `target` option.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn access(&self) -> Option<Access> {
        self.access
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Error produced while building a [`RouteTable`].
#[derive(Error, Debug)]
pub enum RouteTableError {
    #[error("duplicate route identifier '{0}'")]
    DuplicateId(String),
    #[error("route '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: PatternError,
    },
    #[error("route '{id}': unrecognized HTTP method '{method}'")]
    InvalidMethod { id: String, method: String },
}

/// Immutable collection of routes, pre-sorted into deterministic matching
/// order. Built once at startup; safe for unsynchronized concurrent reads.
#[derive(Debug, Default)]
pub struct RouteTable {
    by_id: HashMap<String, Arc<Route>>,
    candidates: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Build the table from configuration entries, in registration order.
    pub fn from_entries(entries: &[RouteEntry]) -> Result<Self, RouteTableError> {
        let mut builder = Self::builder();
        for entry in entries {
            let pattern =
                PathPattern::parse(&entry.path).map_err(|source| RouteTableError::InvalidPattern {
                    id: entry.id.clone(),
                    source,
                })?;
            let mut methods = Vec::with_capacity(entry.methods.len());
            for raw in &entry.methods {
                let method: Method =
                    raw.parse().map_err(|_| RouteTableError::InvalidMethod {
                        id: entry.id.clone(),
                        method: raw.clone(),
                    })?;
                methods.push(method);
            }
            let mut route = Route::new(&entry.id, pattern, &entry.target).with_methods(methods);
            if let Some(access) = entry.access {
                route = route.with_access(access);
            }
            builder = builder.route(route);
        }
        builder.build()
    }

    /// Look up a route by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<Route>> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Routes in matching priority order: literal patterns first, then
    /// variable patterns, then wildcard patterns; registration order breaks
    /// ties within a class.
    pub(crate) fn candidates(&self) -> &[Arc<Route>] {
        &self.candidates
    }
}

/// Collects routes in registration order and produces the sorted table.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        let mut by_id = HashMap::with_capacity(self.routes.len());
        let mut candidates: Vec<Arc<Route>> = Vec::with_capacity(self.routes.len());

        for route in self.routes {
            let route = Arc::new(route);
            if by_id
                .insert(route.id().to_string(), route.clone())
                .is_some()
            {
                return Err(RouteTableError::DuplicateId(route.id().to_string()));
            }
            candidates.push(route);
        }

        // Stable sort keeps registration order within a specificity class.
        candidates.sort_by_key(|r| r.pattern().specificity_class());

        Ok(RouteTable { by_id, candidates })
    }
}
