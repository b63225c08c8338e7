//! One-shot route reordering.
//!
//! # Responsibilities
//! - Read the current routes from a route store
//! - Stable-sort them by precedence
//! - Install the sorted routes back into the store
//! - Do all of the above at most once per coordinator
//!
//! # Design Decisions
//! - The once-flag is taken with a single compare-and-set before any work,
//!   so an empty table still consumes the one shot
//! - Concurrent callers that lose the race return immediately
//! - Store failures are returned, never retried

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::{precedence, RouteCollection, RouteStore, RouteTableError};

/// What a call to [`ReorderCoordinator::reorder`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The table was replaced with `routes` sorted routes.
    Reordered { routes: usize },
    /// The table had no routes; nothing was written.
    Empty,
    /// An earlier call already ran; nothing was done.
    AlreadyReordered,
}

impl ReorderOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReorderOutcome::Reordered { .. } => "reordered",
            ReorderOutcome::Empty => "empty",
            ReorderOutcome::AlreadyReordered => "already_reordered",
        }
    }
}

/// Errors surfaced by a reorder.
#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("failed to install reordered routes: {0}")]
    Install(#[from] RouteTableError),
}

/// Reorders a route store by precedence, exactly once.
#[derive(Debug)]
pub struct ReorderCoordinator<S> {
    store: Arc<S>,
    reordered: AtomicBool,
}

impl<S> ReorderCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            reordered: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns true once a reorder has been attempted.
    pub fn is_reordered(&self) -> bool {
        self.reordered.load(Ordering::Acquire)
    }

    /// Sort the store's routes by precedence and install them.
    ///
    /// Only the first call does anything; later and concurrent calls return
    /// [`ReorderOutcome::AlreadyReordered`].
    pub fn reorder<T>(&self) -> Result<ReorderOutcome, ReorderError>
    where
        S: RouteStore<T>,
    {
        if self
            .reordered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Routes already reordered, skipping");
            metrics::record_reorder(ReorderOutcome::AlreadyReordered.as_str());
            return Ok(ReorderOutcome::AlreadyReordered);
        }

        let mut routes = self.store.routes();
        if routes.is_empty() {
            tracing::info!("Route table is empty, nothing to reorder");
            metrics::record_reorder(ReorderOutcome::Empty.as_str());
            return Ok(ReorderOutcome::Empty);
        }

        // `sort_by` is stable: equal templates keep registration order.
        routes.sort_by(|a, b| precedence::compare(a.template(), b.template()));

        let count = routes.len();
        let ordered: RouteCollection<T> = routes.into_iter().collect();

        if let Err(e) = self.store.replace(ordered) {
            tracing::error!(error = %e, "Failed to install reordered routes");
            metrics::record_reorder("failed");
            return Err(e.into());
        }

        tracing::info!(routes = count, "Routes reordered by precedence");
        metrics::record_reorder(ReorderOutcome::Reordered { routes: count }.as_str());
        metrics::record_table_size(count);
        Ok(ReorderOutcome::Reordered { routes: count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Route, RouteTable, RouteTemplate};

    fn table(templates: &[&str]) -> Arc<RouteTable<usize>> {
        let table = RouteTable::new();
        for (i, template) in templates.iter().enumerate() {
            table
                .register(Route::new(
                    format!("r{}", i),
                    RouteTemplate::parse(template).unwrap(),
                    i,
                ))
                .unwrap();
        }
        Arc::new(table)
    }

    fn templates(table: &RouteTable<usize>) -> Vec<String> {
        table
            .routes()
            .iter()
            .map(|r| r.template().as_str().to_string())
            .collect()
    }

    #[test]
    fn test_reorder_sorts_by_precedence() {
        let table = table(&["{id}", "users/me", "users/{id:int}", "users/{id}"]);
        let coordinator = ReorderCoordinator::new(table.clone());

        let outcome = coordinator.reorder::<usize>().unwrap();
        assert_eq!(outcome, ReorderOutcome::Reordered { routes: 4 });
        assert_eq!(
            templates(&table),
            vec!["users/me", "users/{id:int}", "users/{id}", "{id}"]
        );
    }

    #[test]
    fn test_second_call_is_a_no_op() {
        let table = table(&["b", "a"]);
        let coordinator = ReorderCoordinator::new(table.clone());

        coordinator.reorder::<usize>().unwrap();
        let after_first = templates(&table);
        let snapshot = table.snapshot();

        assert_eq!(coordinator.reorder::<usize>().unwrap(), ReorderOutcome::AlreadyReordered);
        assert_eq!(templates(&table), after_first);
        assert!(Arc::ptr_eq(&snapshot, &table.snapshot()));
    }

    #[test]
    fn test_empty_table_consumes_the_flag() {
        let table = table(&[]);
        let coordinator = ReorderCoordinator::new(table.clone());

        assert_eq!(coordinator.reorder::<usize>().unwrap(), ReorderOutcome::Empty);
        assert!(coordinator.is_reordered());

        table
            .register(Route::new("late", RouteTemplate::parse("x").unwrap(), 0))
            .unwrap();
        assert_eq!(coordinator.reorder::<usize>().unwrap(), ReorderOutcome::AlreadyReordered);
    }

    #[test]
    fn test_equal_templates_keep_registration_order() {
        let table = table(&["{a}", "x", "{b}", "{c}"]);
        let coordinator = ReorderCoordinator::new(table.clone());
        coordinator.reorder::<usize>().unwrap();

        let targets: Vec<usize> = table.routes().iter().map(|r| *r.target()).collect();
        assert_eq!(targets, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_nested_groups_are_flattened() {
        let table: Arc<RouteTable<usize>> = Arc::new(RouteTable::new());
        let mut group = RouteCollection::named("users");
        group.push(Route::new("by-id", RouteTemplate::parse("users/{id}").unwrap(), 0));
        group.push(Route::new("me", RouteTemplate::parse("users/me").unwrap(), 1));
        table.register_group(group).unwrap();

        ReorderCoordinator::new(table.clone()).reorder::<usize>().unwrap();

        let snapshot = table.snapshot();
        assert_eq!(snapshot.entries().len(), 2);
        assert_eq!(templates(&table), vec!["users/me", "users/{id}"]);
    }
}
