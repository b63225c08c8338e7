//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Register routes → Install reorder triggers
//!     → host_initialized fires (primary reorder) → Bind + serve
//!     → application_started fires (fallback reorder)
//!
//! Signals (signal.rs):
//!     One-shot lifecycle notifiers the reorder attaches to
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C → broadcast → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: routes first, then triggers, then listeners
//! - Lifecycle signals are owned by the host and passed in explicitly

pub mod shutdown;
pub mod signal;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signal::{AttachError, Lifecycle, LifecycleSignal, Notifier, Subscription};
pub use startup::{bind, build_table, Host, StartupError};
