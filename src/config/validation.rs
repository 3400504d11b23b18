//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every location's greeting directives compile
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting locations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::greeting::{ConfigError, RouteConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} \"{value}\"")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("location #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate location name \"{0}\"")]
    DuplicateName(String),

    #[error("location \"{location}\": path_prefix \"{prefix}\" must start with '/'")]
    InvalidPrefix { location: String, prefix: String },

    #[error("location \"{location}\" overlaps an earlier location with the same host and prefix")]
    DuplicateMatch { location: String },

    #[error("location \"{location}\": {source}")]
    Directive {
        location: String,
        #[source]
        source: ConfigError,
    },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_connections",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut names = HashSet::new();
    let mut matches = HashSet::new();
    for (index, location) in config.locations.iter().enumerate() {
        if location.name.is_empty() {
            errors.push(ValidationError::EmptyName { index });
        } else if !names.insert(location.name.as_str()) {
            errors.push(ValidationError::DuplicateName(location.name.clone()));
        }

        if !location.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                location: location.name.clone(),
                prefix: location.path_prefix.clone(),
            });
        }

        let host = location.host.as_deref().map(str::to_ascii_lowercase);
        if !matches.insert((host, location.path_prefix.as_str())) {
            errors.push(ValidationError::DuplicateMatch {
                location: location.name.clone(),
            });
        }

        if let Err(source) = RouteConfig::check(location.directives.as_slice()) {
            errors.push(ValidationError::Directive {
                location: location.name.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
