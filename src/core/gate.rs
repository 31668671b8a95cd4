//! The authentication gate.
//!
//! Runs after route matching and before the handler: bootstraps the identity
//! via the [`Authenticator`] port, applies the access policy decision,
//! resolves the locale and publishes the `backend.user` and `workspace`
//! aspects into the request context. Fails closed: when a session is required
//! and none is valid, the gate aborts before publishing anything, so a
//! handler never observes a half-populated context.
use std::sync::Arc;

use crate::{
    core::{
        context::{
            Aspect, AspectRegistry, RequestContext, USER_ASPECT, UserAspect, WORKSPACE_ASPECT,
            WorkspaceAspect,
        },
        error::PipelineError,
        policy::AccessPolicy,
        route::Access,
    },
    metrics,
    ports::{
        authenticator::{Authenticator, Credentials, Identity},
        localizer::LocaleResolver,
    },
};

/// Orchestrates identity bootstrap, access enforcement and aspect publishing
/// for one request. Collaborators are injected once at startup; an instance is
/// cheap to share behind `Arc`.
pub struct AuthenticationGate {
    authenticator: Arc<dyn Authenticator>,
    locales: Arc<dyn LocaleResolver>,
    policy: AccessPolicy,
}

impl AuthenticationGate {
    pub fn new(authenticator: Arc<dyn Authenticator>, locales: Arc<dyn LocaleResolver>) -> Self {
        Self {
            authenticator,
            locales,
            policy: AccessPolicy::new(),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Process a matched request context.
    ///
    /// Returns the enriched context on success. On `Unauthorized` or a
    /// bootstrap failure the input context is left as it was: no aspect is
    /// published.
    pub async fn process(
        &self,
        ctx: &RequestContext,
        credentials: &Credentials,
    ) -> Result<RequestContext, PipelineError> {
        // Re-entrant processing of an already-enriched context is a no-op;
        // bootstrapping twice must not create a second session.
        if ctx.aspects().user().is_some() {
            return Ok(ctx.clone());
        }

        let identity = self.authenticator.resolve_identity(credentials).await?;

        let public = ctx.is_public()
            || ctx
                .route()
                .map(|route| self.policy.is_public(route))
                .unwrap_or(false);

        if !public && !self.is_permitted(&identity, ctx) {
            let path = ctx.path().unwrap_or("/").to_string();
            metrics::increment_unauthorized(&path);
            tracing::debug!(path = %path, "rejecting request without a valid session");
            return Err(PipelineError::Unauthorized { path });
        }

        let locale = self.locales.resolve(&identity);

        // Both aspects are published together; enforcement has already
        // passed, so the registry can no longer be abandoned half-filled.
        let mut aspects = AspectRegistry::new();
        aspects.set_aspect(USER_ASPECT, Aspect::User(UserAspect::from(&identity)));
        aspects.set_aspect(
            WORKSPACE_ASPECT,
            Aspect::Workspace(
                identity
                    .workspace
                    .as_deref()
                    .map(WorkspaceAspect::new)
                    .unwrap_or_else(WorkspaceAspect::live),
            ),
        );

        Ok(ctx.with_locale(locale).with_aspects(aspects))
    }

    fn is_permitted(&self, identity: &Identity, ctx: &RequestContext) -> bool {
        if !identity.authenticated {
            return false;
        }
        match ctx.route().and_then(|route| route.access()) {
            Some(Access::Admin) => identity.admin,
            _ => true,
        }
    }
}
