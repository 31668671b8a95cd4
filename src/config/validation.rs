use std::{collections::HashSet, net::SocketAddr};

use http::Method;

use crate::{
    config::models::{RouteEntry, ServerConfig},
    core::route::PathPattern,
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if !config.login_path.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: "login_path".to_string(),
                message: "must start with '/'".to_string(),
            });
        }

        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        } else {
            for entry in &config.routes {
                if let Err(mut route_errors) = Self::validate_single_route(entry) {
                    errors.append(&mut route_errors);
                }
            }
            errors.extend(Self::check_route_conflicts(&config.routes));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate a single route entry
    fn validate_single_route(entry: &RouteEntry) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if entry.id.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "route id".to_string(),
            });
        }

        if let Err(e) = PathPattern::parse(&entry.path) {
            errors.push(ValidationError::InvalidField {
                field: format!("route '{}' path", entry.id),
                message: e.to_string(),
            });
        }

        if entry.target.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("route '{}' target", entry.id),
            });
        }

        for method in &entry.methods {
            if method.parse::<Method>().is_err() {
                errors.push(ValidationError::InvalidField {
                    field: format!("route '{}' methods", entry.id),
                    message: format!("unrecognized HTTP method '{method}'"),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Detect duplicate identifiers and duplicate literal patterns
    fn check_route_conflicts(routes: &[RouteEntry]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut ids = HashSet::new();
        let mut patterns = HashSet::new();

        for entry in routes {
            if !ids.insert(entry.id.as_str()) {
                errors.push(ValidationError::RouteConflict {
                    message: format!("duplicate route identifier '{}'", entry.id),
                });
            }
            if !patterns.insert(entry.path.as_str()) {
                errors.push(ValidationError::RouteConflict {
                    message: format!(
                        "pattern '{}' registered more than once; the first registration shadows the rest",
                        entry.path
                    ),
                });
            }
        }

        errors
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let messages: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        format!(
            "Found {} validation error(s):\n{}",
            errors.len(),
            messages.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::route::Access;

    fn entry(id: &str, path: &str, target: &str) -> RouteEntry {
        RouteEntry {
            id: id.to_string(),
            path: path.to_string(),
            target: target.to_string(),
            access: None,
            methods: vec![],
        }
    }

    fn valid_config() -> ServerConfig {
        ServerConfig::builder()
            .listen_addr("127.0.0.1:8080")
            .route(RouteEntry {
                access: Some(Access::Public),
                ..entry("login", "/login", "login")
            })
            .route(entry("module", "/modules/{module}", "module"))
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_valid_config() {
        assert!(ServerConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_bad_listen_address() {
        let mut config = valid_config();
        config.listen_addr = "not-an-address".to_string();
        assert!(ServerConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn rejects_empty_route_list() {
        let config = ServerConfig::default();
        assert!(ServerConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn rejects_invalid_pattern() {
        let mut config = valid_config();
        config.routes.push(entry("bad", "no-slash", "bad"));
        assert!(ServerConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn rejects_duplicate_ids_and_patterns() {
        let mut config = valid_config();
        config.routes.push(entry("login", "/other", "other"));
        config.routes.push(entry("shadow", "/login", "other"));
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate route identifier"));
        assert!(message.contains("registered more than once"));
    }

    #[test]
    fn rejects_unknown_method() {
        let mut config = valid_config();
        config.routes.push(RouteEntry {
            methods: vec!["FETCH".to_string()],
            ..entry("m", "/m", "m")
        });
        assert!(ServerConfigValidator::validate(&config).is_err());
    }
}
