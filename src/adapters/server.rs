//! Pipeline assembly.
//!
//! The router is constructed once at startup with concrete collaborator
//! instances passed in; nothing is resolved dynamically per request. Stage
//! order is fixed: observability, route matcher, authentication gate, then
//! the handler dispatcher.
use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    adapters::{
        handlers::{HandlerRegistry, dispatch},
        middleware::{
            create_auth_gate_middleware, create_route_matcher_middleware,
            request_observability_middleware,
        },
    },
    config::models::ServerConfig,
    core::{gate::AuthenticationGate, matcher::RouteMatcher, route::RouteTable},
};

/// Build the middleware pipeline over the given collaborators.
pub fn build_pipeline(
    table: Arc<RouteTable>,
    gate: Arc<AuthenticationGate>,
    registry: Arc<HandlerRegistry>,
    config: Arc<ServerConfig>,
) -> Router {
    let matcher = Arc::new(RouteMatcher::new(table));

    // Layers run outermost-last: observability wraps matching wraps the gate.
    Router::new()
        .fallback(dispatch)
        .with_state(registry)
        .layer(middleware::from_fn(create_auth_gate_middleware(
            gate,
            config.clone(),
        )))
        .layer(middleware::from_fn(create_route_matcher_middleware(
            matcher,
        )))
        .layer(middleware::from_fn(request_observability_middleware))
        .layer(TraceLayer::new_for_http())
}
