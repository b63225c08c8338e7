//! Wiring the reorder to lifecycle notifiers.
//!
//! # Triggers
//! - Primary: fires once route registration is complete, before traffic.
//!   Attaching is best effort; failure is logged at debug and ignored.
//!   A failed reorder is returned through the task handle.
//! - Fallback: fires once the host has started serving. Always attached.
//!   Requests served between start and reorder see registration order.
//!
//! Whichever fires first reorders; the other finds the flag taken.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::lifecycle::signal::Notifier;
use crate::reorder::coordinator::{ReorderCoordinator, ReorderError, ReorderOutcome};
use crate::routing::RouteStore;

/// Handles to the spawned trigger tasks.
#[derive(Debug)]
pub struct ReorderTriggers {
    /// `None` when the primary notifier could not be attached.
    pub primary: Option<JoinHandle<Result<Option<ReorderOutcome>, ReorderError>>>,
    pub fallback: JoinHandle<Result<Option<ReorderOutcome>, ReorderError>>,
}

impl ReorderTriggers {
    /// Attach the coordinator to both notifiers.
    ///
    /// Each task resolves to `Ok(None)` if its notifier went away without
    /// firing, and to the reorder error if the store rejected the write.
    pub fn install<S, T>(
        coordinator: Arc<ReorderCoordinator<S>>,
        primary: &dyn Notifier,
        fallback: &dyn Notifier,
    ) -> Self
    where
        S: RouteStore<T> + 'static,
        T: 'static,
    {
        let primary = match primary.subscribe() {
            Ok(subscription) => {
                let coordinator = coordinator.clone();
                let name = primary.name();
                Some(tokio::spawn(async move {
                    if !subscription.fired().await {
                        return Ok(None);
                    }
                    tracing::debug!(trigger = name, "Primary reorder trigger fired");
                    coordinator.reorder::<T>().map(Some)
                }))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Primary reorder trigger not attached, relying on fallback");
                None
            }
        };

        let fallback = match fallback.subscribe() {
            Ok(subscription) => {
                let name = fallback.name();
                tokio::spawn(async move {
                    if !subscription.fired().await {
                        return Ok(None);
                    }
                    tracing::debug!(trigger = name, "Fallback reorder trigger fired");
                    coordinator.reorder::<T>().map(Some)
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fallback reorder trigger not attached, reordering now");
                tokio::spawn(async move { coordinator.reorder::<T>().map(Some) })
            }
        };

        Self { primary, fallback }
    }
}
