//! Startup orchestration.
//!
//! # Responsibilities
//! - Register configured routes in registration order
//! - Attach the reorder coordinator to the lifecycle signals
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The primary trigger completes before the listener accepts traffic
//! - A failed reorder from either trigger is propagated to the caller

use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinError;

use crate::config::schema::{parse_method, RouteConfig, RouteGroupConfig};
use crate::config::HostConfig;
use crate::http::{Endpoint, HostServer};
use crate::lifecycle::signal::Lifecycle;
use crate::observability::metrics;
use crate::reorder::{ReorderCoordinator, ReorderError, ReorderTriggers};
use crate::routing::{Route, RouteCollection, RouteTable, RouteTableError, RouteTemplate, TemplateError};

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route '{route}' has an invalid template: {source}")]
    Template {
        route: String,
        #[source]
        source: TemplateError,
    },

    #[error("failed to register routes: {0}")]
    Table(#[from] RouteTableError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error(transparent)]
    Reorder(#[from] ReorderError),

    #[error("background task failed: {0}")]
    Join(#[from] JoinError),
}

/// Build the route table from configuration, in registration order.
pub fn build_table(config: &HostConfig) -> Result<RouteTable<Endpoint>, StartupError> {
    let table = RouteTable::new();
    for route in &config.routes {
        table.register(build_route(route)?)?;
    }
    for group in &config.groups {
        table.register_group(build_group(group)?)?;
    }

    tracing::info!(
        routes = table.len(),
        groups = config.groups.len(),
        "Routes registered"
    );
    metrics::record_table_size(table.len());
    Ok(table)
}

fn build_route(config: &RouteConfig) -> Result<Route<Endpoint>, StartupError> {
    let template = RouteTemplate::parse(&config.template).map_err(|source| StartupError::Template {
        route: config.name.clone(),
        source,
    })?;
    // Unknown methods are rejected during validation.
    let methods = config.methods.iter().filter_map(|m| parse_method(m)).collect();
    Ok(Route::new(&config.name, template, Endpoint::new(config.target())).with_methods(methods))
}

fn build_group(config: &RouteGroupConfig) -> Result<RouteCollection<Endpoint>, StartupError> {
    let mut group = RouteCollection::named(&config.name);
    for route in &config.routes {
        group.push(build_route(route)?);
    }
    for nested in &config.groups {
        group.push_group(build_group(nested)?);
    }
    Ok(group)
}

/// Bind the configured listener address.
pub async fn bind(config: &HostConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}

/// A configured host: route table, reorder coordinator and lifecycle.
pub struct Host {
    config: HostConfig,
    table: Arc<RouteTable<Endpoint>>,
    coordinator: Arc<ReorderCoordinator<RouteTable<Endpoint>>>,
    lifecycle: Lifecycle,
}

impl Host {
    pub fn new(config: HostConfig) -> Result<Self, StartupError> {
        let table = Arc::new(build_table(&config)?);
        let coordinator = Arc::new(ReorderCoordinator::new(table.clone()));
        Ok(Self {
            config,
            table,
            coordinator,
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn table(&self) -> &Arc<RouteTable<Endpoint>> {
        &self.table
    }

    pub fn coordinator(&self) -> &Arc<ReorderCoordinator<RouteTable<Endpoint>>> {
        &self.coordinator
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Run the host until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        let triggers = if self.config.reorder.enabled {
            Some(ReorderTriggers::install::<_, Endpoint>(
                self.coordinator.clone(),
                &self.lifecycle.host_initialized,
                &self.lifecycle.application_started,
            ))
        } else {
            tracing::info!("Route reordering disabled, matching in registration order");
            None
        };

        self.lifecycle.host_initialized.fire();
        let fallback = match triggers {
            Some(ReorderTriggers { primary, fallback }) => {
                if let Some(primary) = primary {
                    if let Some(outcome) = primary.await?? {
                        tracing::debug!(outcome = outcome.as_str(), "Primary reorder finished");
                    }
                }
                Some(fallback)
            }
            None => None,
        };

        let server = HostServer::new(self.table.clone(), &self.config);
        let serving = tokio::spawn(server.run(listener, shutdown));

        self.lifecycle.application_started.fire();
        if let Some(fallback) = fallback {
            if let Some(outcome) = fallback.await?? {
                tracing::debug!(outcome = outcome.as_str(), "Fallback reorder finished");
            }
        }

        serving.await?.map_err(StartupError::Serve)
    }
}
