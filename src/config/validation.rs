//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse every route template so bad templates fail at load time
//! - Check route names are present and unique
//! - Validate value ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{parse_method, HostConfig};
use crate::routing::{RouteTemplate, TemplateError};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route with template '{0}' has an empty name")]
    EmptyRouteName(String),

    #[error("route name '{0}' is used more than once")]
    DuplicateRouteName(String),

    #[error("route '{route}' has an invalid template: {source}")]
    InvalidTemplate {
        route: String,
        #[source]
        source: TemplateError,
    },

    #[error("route '{route}' lists unknown method '{method}'")]
    UnknownMethod { route: String, method: String },

    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
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
    for route in config.all_routes() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(route.template.clone()));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if let Err(source) = RouteTemplate::parse(&route.template) {
            errors.push(ValidationError::InvalidTemplate {
                route: route.name.clone(),
                source,
            });
        }

        for method in &route.methods {
            if parse_method(method).is_none() {
                errors.push(ValidationError::UnknownMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
