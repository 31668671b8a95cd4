//! Axum middleware stages of the request pipeline.
//!
//! Each stage reads the [`RequestContext`] left in the request extensions by
//! the previous stage and either inserts a derived context for the next stage
//! or short-circuits with a response. Contexts are never mutated in place;
//! concurrent requests share nothing but the immutable route table and the
//! injected collaborators.
use std::{future::Future, pin::Pin, sync::Arc};

use axum::{
    Json,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode, header};
use tracing::Instrument;

use crate::{
    adapters::session::extract_credentials,
    config::models::ServerConfig,
    core::{
        context::RequestContext,
        error::PipelineError,
        gate::AuthenticationGate,
        matcher::RouteMatcher,
    },
    metrics, tracing_setup,
};

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Resolve the request path against the route table and attach the matched
/// route, its `target` option and the resolved `public` flag to the context.
/// An unmatched path aborts the pipeline here; the authentication gate never
/// sees it.
pub async fn route_matcher_middleware(
    req: Request,
    next: Next,
    matcher: Arc<RouteMatcher>,
) -> Response {
    let path = req.uri().path().to_string();
    let wants_json = wants_json(req.headers());

    match matcher.match_request(&path, req.method()) {
        Ok(matched) => {
            tracing::debug!(path = %path, route = matched.route.id(), "route matched");
            tracing::Span::current().record("route.id", matched.route.id());
            let ctx = RequestContext::new().with_route_match(&matched);
            let mut req = req;
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => {
            metrics::increment_route_not_found(&path);
            tracing::debug!(path = %path, "no route matched");
            error_response(&err, "/", wants_json)
        }
    }
}

/// Create a cloneable closure wrapping [`route_matcher_middleware`].
pub fn create_route_matcher_middleware(
    matcher: Arc<RouteMatcher>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let matcher = matcher.clone();
        Box::pin(async move { route_matcher_middleware(req, next, matcher).await })
    }
}

/// Bootstrap the identity, enforce the access decision and publish the
/// identity/workspace aspects before the handler runs.
pub async fn auth_gate_middleware(
    req: Request,
    next: Next,
    gate: Arc<AuthenticationGate>,
    config: Arc<ServerConfig>,
) -> Response {
    let wants_json = wants_json(req.headers());
    let credentials = extract_credentials(req.headers(), &config.session.cookie_name);

    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        tracing::error!("authentication gate reached without a matched route context");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "request context missing"})),
        )
            .into_response();
    };

    match gate.process(&ctx, &credentials).await {
        Ok(enriched) => {
            let mut req = req;
            req.extensions_mut().insert(enriched);
            next.run(req).await
        }
        Err(err) => error_response(&err, &config.login_path, wants_json),
    }
}

/// Create a cloneable closure wrapping [`auth_gate_middleware`].
pub fn create_auth_gate_middleware(
    gate: Arc<AuthenticationGate>,
    config: Arc<ServerConfig>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let gate = gate.clone();
        let config = config.clone();
        Box::pin(async move { auth_gate_middleware(req, next, gate, config).await })
    }
}

/// Generate a per-request UUID, expose it via the request span and the
/// `X-Request-ID` response header, and record request count and latency.
pub async fn request_observability_middleware(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let span = tracing_setup::create_request_span(&method, &path, &request_id);
    let _timer = metrics::RequestTimer::new(&path, &method);

    let mut response = next.run(req).instrument(span.clone()).await;

    span.record("http.status_code", response.status().as_u16());
    metrics::increment_request_total(&path, &method, response.status().as_u16());
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Map a pipeline error to its boundary response. This is the only place
/// pipeline errors become HTTP; handlers never observe them.
fn error_response(err: &PipelineError, login_path: &str, wants_json: bool) -> Response {
    match err {
        PipelineError::RouteNotFound { path } => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "not found", "path": path})),
        )
            .into_response(),
        PipelineError::Unauthorized { path } => {
            if wants_json {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "authentication required", "path": path})),
                )
                    .into_response()
            } else {
                let location = format!("{login_path}?redirect={}", urlencoding::encode(path));
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
        }
        PipelineError::IdentityBootstrap(source) => {
            tracing::error!(error = %source, "identity bootstrap failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "identity bootstrap failed"})),
            )
                .into_response()
        }
    }
}

/// True when the client is an API/XHR caller that expects a status code
/// rather than a login redirect.
fn wants_json(headers: &HeaderMap) -> bool {
    let accepts_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let is_xhr = headers
        .get("X-Requested-With")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    accepts_json || is_xhr
}
