//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → dispatch.rs (first matching route in live table order)
//!     → JSON response: route, template, target, values
//! ```

pub mod dispatch;
pub mod server;

pub use dispatch::Endpoint;
pub use server::{HostServer, ADMIN_ROUTES_PATH};
