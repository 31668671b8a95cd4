pub mod context;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod policy;
pub mod route;

pub use context::{AspectRegistry, RequestContext};
pub use error::PipelineError;
pub use gate::AuthenticationGate;
pub use matcher::{RouteMatch, RouteMatcher};
pub use policy::AccessPolicy;
pub use route::{Access, PathPattern, Route, RouteTable};
