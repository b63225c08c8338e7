//! Route reordering subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle notifier fires (primary or fallback)
//!     → triggers.rs (spawned listener task)
//!     → coordinator.rs reorder()
//!         → once-flag check-and-set (losers return)
//!         → store.routes() (flattened)
//!         → stable sort by routing::precedence
//!         → store.replace(sorted)
//! ```
//!
//! # Design Decisions
//! - The coordinator owns its once-flag; no process-global state
//! - Notifiers are injected, never discovered
//! - No retries: the second trigger is the only redundancy

pub mod coordinator;
pub mod triggers;

pub use coordinator::{ReorderCoordinator, ReorderError, ReorderOutcome};
pub use triggers::ReorderTriggers;
