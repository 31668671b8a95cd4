//! Handler registry and the built-in module handlers.
//!
//! The pipeline treats handlers as opaque continuations: a matched route's
//! `target` option names an entry in the [`HandlerRegistry`], and the
//! dispatcher invokes it with the enriched request context. The handlers here
//! are the few the admin backend ships itself; application modules register
//! their own at startup.
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use http::{StatusCode, header};

use crate::{
    adapters::session::{SessionStore, extract_credentials},
    core::context::RequestContext,
    ports::handler::ModuleHandler,
};

/// Maps `target` option values to handler implementations. Populated once at
/// startup; read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ModuleHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: impl Into<String>, handler: Arc<dyn ModuleHandler>) {
        let target = target.into();
        if self
            .handlers
            .insert(target.clone(), handler)
            .is_some()
        {
            tracing::warn!(handler = %target, "handler target registered twice; keeping the last one");
        }
    }

    pub fn get(&self, target: &str) -> Option<&Arc<dyn ModuleHandler>> {
        self.handlers.get(target)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Terminal pipeline stage: looks up the matched route's target and invokes
/// it. Reaching this point without an enriched context is a wiring bug, not a
/// client error.
pub async fn dispatch(State(registry): State<Arc<HandlerRegistry>>, req: Request) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        tracing::error!("dispatcher reached without a request context");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "request context missing"})),
        )
            .into_response();
    };

    let Some(target) = ctx.target() else {
        tracing::error!("dispatcher reached without a resolved target");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "route target missing"})),
        )
            .into_response();
    };

    match registry.get(target) {
        Some(handler) => handler.handle(req, &ctx).await,
        None => {
            tracing::error!(handler = %target, "no handler registered for route target");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "handler not registered", "target": target})),
            )
                .into_response()
        }
    }
}

/// Renders the login surface. Credential verification happens at the identity
/// provider behind the [`SessionStore`], not here.
pub struct LoginHandler;

#[async_trait]
impl ModuleHandler for LoginHandler {
    async fn handle(&self, _req: Request<Body>, ctx: &RequestContext) -> Response {
        let logged_in = ctx
            .aspects()
            .user()
            .map(|user| user.authenticated)
            .unwrap_or(false);
        Json(serde_json::json!({
            "module": "login",
            "logged_in": logged_in,
        }))
        .into_response()
    }
}

/// Closes the presented session and redirects back to the login surface.
pub struct LogoutHandler {
    store: Arc<SessionStore>,
    cookie_name: String,
    login_path: String,
}

impl LogoutHandler {
    pub fn new(store: Arc<SessionStore>, cookie_name: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self {
            store,
            cookie_name: cookie_name.into(),
            login_path: login_path.into(),
        }
    }
}

#[async_trait]
impl ModuleHandler for LogoutHandler {
    async fn handle(&self, req: Request<Body>, _ctx: &RequestContext) -> Response {
        if let Some(token) = extract_credentials(req.headers(), &self.cookie_name).session_token {
            self.store.close_session(&token).await;
        }
        (
            StatusCode::FOUND,
            [(header::LOCATION, self.login_path.clone())],
        )
            .into_response()
    }
}

/// Reports the enriched request context back to the caller. Used as the
/// default module target in the shipped configuration; real application
/// modules replace it.
pub struct StatusHandler;

#[async_trait]
impl ModuleHandler for StatusHandler {
    async fn handle(&self, _req: Request<Body>, ctx: &RequestContext) -> Response {
        let user = ctx.aspects().user();
        let body = serde_json::json!({
            "route": ctx.route().map(|route| route.id()),
            "target": ctx.target(),
            "public": ctx.is_public(),
            "params": ctx.params(),
            "identity": user.map(|user| serde_json::json!({
                "id": user.id,
                "username": user.username,
                "authenticated": user.authenticated,
                "admin": user.admin,
            })),
            "workspace": ctx.aspects().workspace().map(|workspace| workspace.id.clone()),
            "locale": ctx.locale().map(|locale| locale.tag.clone()),
        });
        Json(body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;

    use super::*;
    use crate::core::{
        matcher::RouteMatch,
        route::{PathPattern, Route},
    };

    fn ctx_for(target: &str) -> RequestContext {
        RequestContext::new().with_route_match(&RouteMatch {
            route: Arc::new(Route::new(
                "module",
                PathPattern::parse("/modules/foo").unwrap(),
                target,
            )),
            params: StdHashMap::new(),
            path: "/modules/foo".to_string(),
        })
    }

    #[tokio::test]
    async fn dispatch_rejects_unregistered_target() {
        let registry = Arc::new(HandlerRegistry::new());
        let mut req = Request::builder().uri("/modules/foo").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ctx_for("missing"));

        let response = dispatch(State(registry), req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn dispatch_invokes_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register("status", Arc::new(StatusHandler));
        let mut req = Request::builder().uri("/modules/foo").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ctx_for("status"));

        let response = dispatch(State(Arc::new(registry)), req).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dispatch_rejects_missing_context() {
        let registry = Arc::new(HandlerRegistry::new());
        let req = Request::builder().uri("/modules/foo").body(Body::empty()).unwrap();

        let response = dispatch(State(registry), req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn logout_closes_the_session_and_redirects() {
        let store = Arc::new(SessionStore::new(3600));
        let token = store.open_session(7, "editor", false, None, None).await;
        let handler = LogoutHandler::new(store.clone(), "atrium_session", "/login");

        let req = Request::builder()
            .uri("/logout")
            .header(header::COOKIE, format!("atrium_session={token}"))
            .body(Body::empty())
            .unwrap();
        let response = handler.handle(req, &ctx_for("logout")).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
        assert_eq!(store.session_count(), 0);
    }
}
