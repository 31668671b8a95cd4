//! Locale resolution adapter.
use crate::ports::{
    authenticator::Identity,
    localizer::{Locale, LocaleResolver},
};

/// Resolves the identity's configured locale, falling back to a fixed
/// default. The localization subsystem consuming the tag is external.
pub struct StaticLocaleResolver {
    default_tag: String,
}

impl StaticLocaleResolver {
    pub fn new(default_tag: impl Into<String>) -> Self {
        Self {
            default_tag: default_tag.into(),
        }
    }
}

impl LocaleResolver for StaticLocaleResolver {
    fn resolve(&self, identity: &Identity) -> Locale {
        Locale::new(identity.locale.as_deref().unwrap_or(&self.default_tag))
    }
}
