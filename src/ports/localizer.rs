//! Port for resolving the language object of an identity.
use crate::ports::authenticator::Identity;

/// A resolved locale. The localization subsystem behind it is external; the
/// pipeline only attaches the tag to the request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub tag: String,
}

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// LocaleResolver defines the port for mapping an identity to its locale.
pub trait LocaleResolver: Send + Sync + 'static {
    fn resolve(&self, identity: &Identity) -> Locale;
}
