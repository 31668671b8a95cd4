pub mod authenticator;
pub mod handler;
pub mod localizer;
