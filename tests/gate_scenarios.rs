// End-to-end pipeline tests: route matching, access enforcement and aspect
// publishing observed from a handler's point of view.
#[cfg(test)]
mod test {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use atrium::{
        adapters::{HandlerRegistry, SessionStore, StaticLocaleResolver, build_pipeline},
        config::models::{RouteEntry, ServerConfig},
        core::{AuthenticationGate, RequestContext, RouteTable, route::Access},
        ports::{
            authenticator::{AuthError, Authenticator, Credentials, Identity},
            handler::ModuleHandler,
        },
    };
    use axum::{Router, body::Body, response::{IntoResponse, Response}};
    use http::{Request, StatusCode, header};
    use tower::ServiceExt; // for oneshot

    /// Counts invocations and records the context the handler observed.
    struct RecordingHandler {
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<RequestContext>>>,
    }

    #[async_trait]
    impl ModuleHandler for RecordingHandler {
        async fn handle(&self, _req: Request<Body>, ctx: &RequestContext) -> Response {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(ctx.clone());
            StatusCode::OK.into_response()
        }
    }

    struct CountingAuthenticator {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Authenticator for CountingAuthenticator {
        async fn resolve_identity(&self, _credentials: &Credentials) -> Result<Identity, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Identity::anonymous())
        }
    }

    struct FailingAuthenticator;

    #[async_trait]
    impl Authenticator for FailingAuthenticator {
        async fn resolve_identity(&self, _credentials: &Credentials) -> Result<Identity, AuthError> {
            Err(AuthError::StoreUnavailable("session store offline".to_string()))
        }
    }

    fn route(id: &str, path: &str, target: &str, access: Option<Access>) -> RouteEntry {
        RouteEntry {
            id: id.to_string(),
            path: path.to_string(),
            target: target.to_string(),
            access,
            methods: vec![],
        }
    }

    fn config() -> Arc<ServerConfig> {
        Arc::new(
            ServerConfig::builder()
                // Intentionally no access option: covered by the legacy
                // allow-list only.
                .route(route("login", "/login", "handler", None))
                .route(route("module", "/modules/{module}", "handler", None))
                .route(route("open", "/open", "handler", Some(Access::Public)))
                .route(route("admin", "/settings", "handler", Some(Access::Admin)))
                .build()
                .unwrap(),
        )
    }

    struct Harness {
        app: Router,
        store: Arc<SessionStore>,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<RequestContext>>>,
    }

    fn harness_with(authenticator: Option<Arc<dyn Authenticator>>) -> Harness {
        let config = config();
        let table = Arc::new(RouteTable::from_entries(&config.routes).unwrap());
        let store = Arc::new(SessionStore::new(3600));
        let authenticator: Arc<dyn Authenticator> = match authenticator {
            Some(authenticator) => authenticator,
            None => store.clone(),
        };
        let gate = Arc::new(AuthenticationGate::new(
            authenticator,
            Arc::new(StaticLocaleResolver::new("en")),
        ));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));
        let mut registry = HandlerRegistry::new();
        registry.register(
            "handler",
            Arc::new(RecordingHandler {
                calls: calls.clone(),
                seen: seen.clone(),
            }),
        );

        let app = build_pipeline(table, gate, Arc::new(registry), config);
        Harness {
            app,
            store,
            calls,
            seen,
        }
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn get_with_cookie(path: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header(header::COOKIE, format!("atrium_session={token}"))
            .body(Body::empty())
            .unwrap()
    }

    // Scenario A: no access option, path on the legacy allow-list.
    #[tokio::test]
    async fn legacy_allow_list_path_is_served_without_a_session() {
        let h = harness();
        let response = h.app.oneshot(get("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let seen = h.seen.lock().unwrap().clone().unwrap();
        assert!(!seen.aspects().user().unwrap().authenticated);
        assert!(seen.aspects().workspace().unwrap().is_live());
    }

    // Scenario B: private route with a valid session cookie.
    #[tokio::test]
    async fn valid_session_reaches_the_handler_with_aspects() {
        let h = harness();
        let token = h
            .store
            .open_session(7, "editor", false, Some("draft".to_string()), Some("de".to_string()))
            .await;

        let response = h
            .app
            .oneshot(get_with_cookie("/modules/foo", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let seen = h.seen.lock().unwrap().clone().unwrap();
        let user = seen.aspects().user().unwrap().clone();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "editor");
        assert!(user.authenticated);
        assert_eq!(seen.aspects().workspace().unwrap().id, "draft");
        assert_eq!(seen.locale().unwrap().tag, "de");
        assert_eq!(seen.param("module"), Some("foo"));
    }

    #[tokio::test]
    async fn workspace_defaults_to_live_when_unset() {
        let h = harness();
        let token = h.store.open_session(7, "editor", false, None, None).await;
        let response = h
            .app
            .oneshot(get_with_cookie("/modules/foo", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen = h.seen.lock().unwrap().clone().unwrap();
        assert!(seen.aspects().workspace().unwrap().is_live());
        assert_eq!(seen.locale().unwrap().tag, "en");
    }

    // Scenario C: private route without a session.
    #[tokio::test]
    async fn missing_session_redirects_to_login_and_skips_the_handler() {
        let h = harness();
        let response = h.app.oneshot(get("/modules/foo")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirect=%2Fmodules%2Ffoo"
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert!(h.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn api_clients_get_401_instead_of_a_redirect() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/modules/foo")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_session_token_is_rejected_on_private_routes() {
        let h = harness();
        let response = h
            .app
            .oneshot(get_with_cookie("/modules/foo", "stale-token"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    // Public routes never block, even with an invalid session.
    #[tokio::test]
    async fn public_route_is_served_with_an_invalid_session() {
        let h = harness();
        let response = h
            .app
            .oneshot(get_with_cookie("/open", "stale-token"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    // Scenario D: unmatched path short-circuits before the gate.
    #[tokio::test]
    async fn unmatched_path_never_consults_the_authenticator() {
        let auth_calls = Arc::new(AtomicUsize::new(0));
        let h = harness_with(Some(Arc::new(CountingAuthenticator {
            calls: auth_calls.clone(),
        })));

        let response = h.app.oneshot(get("/does-not-exist")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(auth_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admin_route_requires_an_admin_session() {
        let h = harness();
        let token = h.store.open_session(7, "editor", false, None, None).await;
        let response = h
            .app
            .oneshot(get_with_cookie("/settings", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admin_session_passes_the_admin_route() {
        let h = harness();
        let token = h.store.open_session(1, "admin", true, None, None).await;
        let response = h
            .app
            .oneshot(get_with_cookie("/settings", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bootstrap_failure_is_a_server_error_even_on_public_routes() {
        let h = harness_with(Some(Arc::new(FailingAuthenticator)));
        let response = h.app.oneshot(get("/open")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }
}
