//! Pipeline error taxonomy.
//!
//! All three variants are recovered at the middleware boundary and converted
//! into responses there; they never propagate into route handlers.
use thiserror::Error;

use crate::ports::authenticator::AuthError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// No pattern in the route table matches the request path. Recovered as a
    /// not-found response before the authentication gate runs.
    #[error("no route matches path '{path}'")]
    RouteNotFound { path: String },

    /// The matched route requires an authenticated session and none was
    /// presented. Recovered as a login redirect (or 401 for API clients).
    #[error("authentication required for '{path}'")]
    Unauthorized { path: String },

    /// The authentication collaborator could not establish even an anonymous
    /// identity. Fatal for the request; never downgraded to anonymous.
    #[error("identity bootstrap failed")]
    IdentityBootstrap(#[from] AuthError),
}
