//! Atrium - routing and authentication pipeline for an administrative web
//! backend.
//!
//! Atrium resolves incoming requests against a pre-registered route table,
//! decides whether the matched route requires an authenticated session and,
//! when it does, establishes a per-request security context before the
//! route's handler runs. The crate implements a **hexagonal architecture**:
//! business logic lives in `core`, collaborator interfaces in `ports`, and
//! the axum/session/handler glue in `adapters`.
//!
//! # Features
//! - Deterministic route matching with literal, `{variable}` and
//!   `{*wildcard}` path segments
//! - Fail-closed access policy driven by per-route `access` options, with an
//!   observable legacy allow-list kept for compatibility
//! - Per-request identity bootstrap and aspect publishing (`backend.user`,
//!   `workspace`) through an immutable, copy-on-derive request context
//! - In-process session store with expiry behind the `Authenticator` port
//! - Structured tracing & request metrics, config-file driven startup,
//!   graceful shutdown
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use atrium::{
//!     adapters::{HandlerRegistry, StatusHandler, StaticLocaleResolver, SessionStore, build_pipeline},
//!     core::{AuthenticationGate, RouteTable},
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = Arc::new(atrium::config::load_config("atrium.yaml").await?);
//! let table = Arc::new(RouteTable::from_entries(&config.routes)?);
//! let store = Arc::new(SessionStore::new(config.session.lifetime_secs));
//! let gate = Arc::new(AuthenticationGate::new(
//!     store,
//!     Arc::new(StaticLocaleResolver::new(&config.session.default_locale)),
//! ));
//! let mut registry = HandlerRegistry::new();
//! registry.register("status", Arc::new(StatusHandler));
//! let app = build_pipeline(table, gate, Arc::new(registry), config);
//! # Ok(()) }
//! ```
//!
//! # Concurrency
//! The route table is immutable after startup and shared without locks.
//! Request context and aspect registry are created per request and dropped
//! with it; nothing request-scoped is ever cached across requests.
//!
//! # Error Handling
//! Pipeline failures (`RouteNotFound`, `Unauthorized`, identity bootstrap
//! errors) are converted to responses at the middleware boundary and never
//! reach handlers. Binary-level fallible APIs return `eyre::Result<T>` with
//! context attached via `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

// These modules are implementation details and should not be directly used by users
pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HandlerRegistry, SessionStore, build_pipeline},
    core::{AuthenticationGate, RequestContext, RouteMatcher, RouteTable},
    ports::authenticator::Authenticator,
    utils::GracefulShutdown,
};
