//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: catch-all dispatch plus admin listing
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a bound listener until shutdown

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::HostConfig;
use crate::http::dispatch::{dispatch_handler, list_routes, Endpoint};
use crate::lifecycle::shutdown;
use crate::routing::RouteTable;

/// Path of the admin route listing.
pub const ADMIN_ROUTES_PATH: &str = "/_admin/routes";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable<Endpoint>>,
}

/// HTTP front end that dispatches against a route table.
pub struct HostServer {
    router: Router,
}

impl HostServer {
    pub fn new(table: Arc<RouteTable<Endpoint>>, config: &HostConfig) -> Self {
        let state = AppState { table };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HostConfig, state: AppState) -> Router {
        let mut router = Router::new();
        if config.admin.enabled {
            router = router.route(ADMIN_ROUTES_PATH, get(list_routes));
        }

        router
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
