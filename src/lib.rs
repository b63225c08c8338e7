//! Route precedence ordering for template-based HTTP routing.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reorder;
pub mod routing;

pub use config::schema::HostConfig;
pub use http::HostServer;
pub use lifecycle::{Host, Shutdown};
pub use reorder::{ReorderCoordinator, ReorderOutcome};
pub use routing::{RouteTable, RouteTemplate};
