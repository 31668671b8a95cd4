pub mod handlers;
pub mod locale;
pub mod middleware;
pub mod server;
pub mod session;

/// Re-export commonly used types from adapters
pub use handlers::{HandlerRegistry, LoginHandler, LogoutHandler, StatusHandler};
pub use locale::StaticLocaleResolver;
pub use middleware::*;
pub use server::build_pipeline;
pub use session::{SessionStore, extract_credentials};
