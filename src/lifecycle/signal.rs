//! One-shot lifecycle signals.
//!
//! # Responsibilities
//! - Let the host announce a lifecycle point exactly once
//! - Let any number of listeners wait for it, including late ones
//!
//! # Design Decisions
//! - Built on `tokio::sync::watch` so a listener that subscribes after the
//!   signal fired still completes immediately
//! - Firing twice is a no-op
//! - A closed signal refuses new subscribers; that is an attach failure

use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::watch;

/// Failure to attach a listener to a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("notifier '{0}' is closed")]
    Closed(&'static str),

    #[error("notifier '{0}' is not available")]
    Unavailable(&'static str),
}

/// A source of a single lifecycle event.
pub trait Notifier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Start listening for the event.
    fn subscribe(&self) -> Result<Subscription, AttachError>;
}

/// A pending wait on a lifecycle signal.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<bool>,
}

impl Subscription {
    /// Wait until the signal fires.
    ///
    /// Returns `false` if the signal was dropped without ever firing.
    pub async fn fired(mut self) -> bool {
        self.rx.wait_for(|fired| *fired).await.is_ok()
    }
}

/// A signal that fires once.
#[derive(Debug)]
pub struct LifecycleSignal {
    name: &'static str,
    tx: Mutex<Option<watch::Sender<bool>>>,
    rx: watch::Receiver<bool>,
}

impl LifecycleSignal {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            name,
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Fire the signal. Returns true only for the call that actually fired it.
    pub fn fire(&self) -> bool {
        let guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        let fired = tx.send_if_modified(|state| !std::mem::replace(state, true));
        if fired {
            tracing::debug!(signal = self.name, "Lifecycle signal fired");
        }
        fired
    }

    pub fn has_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Stop accepting subscribers. Pending subscribers that have not seen the
    /// signal fire will resolve with `false`.
    pub fn close(&self) {
        let mut guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }

    fn is_closed(&self) -> bool {
        match self.tx.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl Notifier for LifecycleSignal {
    fn name(&self) -> &'static str {
        self.name
    }

    fn subscribe(&self) -> Result<Subscription, AttachError> {
        if self.is_closed() {
            return Err(AttachError::Closed(self.name));
        }
        Ok(Subscription {
            rx: self.rx.clone(),
        })
    }
}

/// The two lifecycle points the host announces.
#[derive(Debug)]
pub struct Lifecycle {
    /// Fires once route registration is complete, before traffic.
    pub host_initialized: LifecycleSignal,
    /// Fires once the host has started serving.
    pub application_started: LifecycleSignal,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            host_initialized: LifecycleSignal::new("host_initialized"),
            application_started: LifecycleSignal::new("application_started"),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fire_once() {
        let signal = LifecycleSignal::new("test");
        assert!(!signal.has_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.has_fired());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_fired_signal() {
        let signal = LifecycleSignal::new("test");
        signal.fire();
        let sub = signal.subscribe().unwrap();
        assert!(sub.fired().await);
    }

    #[tokio::test]
    async fn test_early_subscriber_wakes_on_fire() {
        let signal = std::sync::Arc::new(LifecycleSignal::new("test"));
        let sub = signal.subscribe().unwrap();
        let waiter = tokio::spawn(sub.fired());
        tokio::task::yield_now().await;
        signal.fire();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_signal_refuses_subscribers() {
        let signal = LifecycleSignal::new("test");
        let pending = signal.subscribe().unwrap();
        signal.close();
        assert_eq!(signal.subscribe().unwrap_err(), AttachError::Closed("test"));
        assert!(!signal.fire());
        assert!(!pending.fired().await);
    }
}
