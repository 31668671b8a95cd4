//! Route matching against the immutable route table.
//!
//! Candidates are tested in the table's priority order (literal patterns
//! before variable patterns before wildcard patterns, registration order
//! within a class); the first satisfying match wins and there is no
//! backtracking across multiple matches. Matching is a pure function over the
//! table and the request path.
use std::{collections::HashMap, sync::Arc};

use http::Method;

use crate::core::{
    error::PipelineError,
    route::{Route, RouteTable},
};

/// A successful match: the bound route, the extracted variable values and the
/// normalized request path they were bound against.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: HashMap<String, String>,
    pub path: String,
}

/// Resolves request paths against a shared [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    table: Arc<RouteTable>,
}

impl RouteMatcher {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Resolve a request path and method to a route.
    pub fn match_request(&self, path: &str, method: &Method) -> Result<RouteMatch, PipelineError> {
        let path = normalize_path(path);

        for route in self.table.candidates() {
            if !route.allows_method(method) {
                continue;
            }
            if let Some(params) = route.pattern().bind(&path) {
                return Ok(RouteMatch {
                    route: route.clone(),
                    params,
                    path,
                });
            }
        }

        Err(PipelineError::RouteNotFound { path })
    }
}

/// Normalize a request path: leading slash, no trailing slash (except the
/// root), collapsed duplicate slashes.
pub fn normalize_path(raw: &str) -> String {
    let mut path = String::with_capacity(raw.len() + 1);
    path.push('/');
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(segment);
    }
    path
}
