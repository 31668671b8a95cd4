//! Port for the handlers invoked after the pipeline.
use async_trait::async_trait;
use axum::{body::Body, response::Response};
use http::Request;

use crate::core::context::RequestContext;

/// ModuleHandler defines the port for the continuation behind a route's
/// `target` option. Handlers only ever see contexts with resolved route and
/// authentication attributes; the pipeline guarantees it.
#[async_trait]
pub trait ModuleHandler: Send + Sync + 'static {
    async fn handle(&self, req: Request<Body>, ctx: &RequestContext) -> Response;
}
