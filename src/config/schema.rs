//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Root configuration for the route-priority host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Route reordering settings.
    pub reorder: ReorderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,

    /// Top-level routes, in registration order.
    pub routes: Vec<RouteConfig>,

    /// Route groups, registered after the top-level routes.
    pub groups: Vec<RouteGroupConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Route reordering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Reorder routes by precedence once the table is populated.
    /// When false, routes are matched in registration order.
    pub enabled: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `GET /_admin/routes` with the live table order.
    pub enabled: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A single route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Unique route name, used in logs and responses.
    pub name: String,

    /// Route template, e.g. "users/{id:int}".
    pub template: String,

    /// Allowed methods. Empty allows any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Dispatch target. Defaults to the route name.
    #[serde(default)]
    pub target: Option<String>,
}

impl RouteConfig {
    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.name)
    }
}

/// A named group of routes, possibly nested.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteGroupConfig {
    pub name: String,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    #[serde(default)]
    pub groups: Vec<RouteGroupConfig>,
}

impl HostConfig {
    /// Every route in registration order: top-level routes, then groups
    /// depth-first.
    pub fn all_routes(&self) -> Vec<&RouteConfig> {
        fn walk<'a>(group: &'a RouteGroupConfig, out: &mut Vec<&'a RouteConfig>) {
            out.extend(group.routes.iter());
            for nested in &group.groups {
                walk(nested, out);
            }
        }

        let mut out: Vec<&RouteConfig> = self.routes.iter().collect();
        for group in &self.groups {
            walk(group, &mut out);
        }
        out
    }
}

/// Parse a standard HTTP method name, case-insensitively.
pub fn parse_method(name: &str) -> Option<Method> {
    match name.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        "PATCH" => Some(Method::PATCH),
        "HEAD" => Some(Method::HEAD),
        "OPTIONS" => Some(Method::OPTIONS),
        "TRACE" => Some(Method::TRACE),
        "CONNECT" => Some(Method::CONNECT),
        _ => None,
    }
}
