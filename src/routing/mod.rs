//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     template text
//!     → template.rs (parse segments, constraint.rs compiles constraints)
//!     → collection.rs (Route, nested RouteCollection)
//!     → table.rs (appended in registration order)
//!
//! Reorder (once):
//!     table.rs routes (flattened)
//!     → precedence.rs (stable sort, most specific first)
//!     → table.rs replace (single atomic swap)
//!
//! Incoming request (method, path):
//!     → table.rs find (first match in table order)
//!     → Return: matched Route + route values, or no match
//! ```
//!
//! # Design Decisions
//! - Deterministic: same table, same request, same route
//! - First match wins, so table order is match priority
//! - Templates are immutable once parsed

pub mod collection;
pub mod constraint;
pub mod precedence;
pub mod table;
pub mod template;

pub use collection::{Route, RouteCollection, RouteEntry};
pub use precedence::compare;
pub use table::{RouteLookup, RouteMatch, RouteStore, RouteTable, RouteTableError};
pub use template::{RouteTemplate, RouteValues, Segment, TemplateError};
