//! Concurrency tests for the one-shot reorder.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use route_priority::lifecycle::Lifecycle;
use route_priority::reorder::{ReorderCoordinator, ReorderOutcome, ReorderTriggers};
use route_priority::routing::{
    Route, RouteCollection, RouteStore, RouteTable, RouteTableError, RouteTemplate,
};

/// Route store that counts writes and uses the default clear-then-add replace.
struct CountingStore {
    routes: Mutex<Vec<Arc<Route<()>>>>,
    clears: AtomicUsize,
    adds: AtomicUsize,
}

impl CountingStore {
    fn new(templates: &[&str]) -> Self {
        let routes = templates
            .iter()
            .enumerate()
            .map(|(i, t)| Arc::new(Route::new(format!("r{i}"), RouteTemplate::parse(t).unwrap(), ())))
            .collect();
        Self {
            routes: Mutex::new(routes),
            clears: AtomicUsize::new(0),
            adds: AtomicUsize::new(0),
        }
    }
}

impl RouteStore<()> for CountingStore {
    fn routes(&self) -> Vec<Arc<Route<()>>> {
        self.routes.lock().unwrap().clone()
    }

    fn clear(&self) -> Result<(), RouteTableError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().unwrap().clear();
        Ok(())
    }

    fn add_all(&self, routes: RouteCollection<()>) -> Result<(), RouteTableError> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().unwrap().extend(routes.flatten());
        Ok(())
    }
}

/// Store whose writes always fail.
struct RejectingStore;

impl RouteStore<()> for RejectingStore {
    fn routes(&self) -> Vec<Arc<Route<()>>> {
        vec![Arc::new(Route::new("r", RouteTemplate::parse("a").unwrap(), ()))]
    }

    fn clear(&self) -> Result<(), RouteTableError> {
        Err(RouteTableError::Rejected("read-only".into()))
    }

    fn add_all(&self, _: RouteCollection<()>) -> Result<(), RouteTableError> {
        Err(RouteTableError::Rejected("read-only".into()))
    }
}

#[test]
fn concurrent_reorders_write_once() {
    let store = Arc::new(CountingStore::new(&["{id}", "users/{id}", "users/me"]));
    let coordinator = Arc::new(ReorderCoordinator::new(store.clone()));
    let barrier = Barrier::new(16);

    let outcomes: Vec<ReorderOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    coordinator.reorder::<()>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let reordered = outcomes
        .iter()
        .filter(|o| matches!(o, ReorderOutcome::Reordered { .. }))
        .count();
    assert_eq!(reordered, 1);
    assert_eq!(store.clears.load(Ordering::SeqCst), 1);
    assert_eq!(store.adds.load(Ordering::SeqCst), 1);

    let order: Vec<String> = store.routes().iter().map(|r| r.template().as_str().to_string()).collect();
    assert_eq!(order, vec!["users/me", "users/{id}", "{id}"]);
}

#[test]
fn store_failure_is_returned_and_not_retried() {
    let coordinator = ReorderCoordinator::new(Arc::new(RejectingStore));

    assert!(coordinator.reorder::<()>().is_err());
    assert_eq!(
        coordinator.reorder::<()>().unwrap(),
        ReorderOutcome::AlreadyReordered
    );
}

#[tokio::test]
async fn fallback_surfaces_store_failure() {
    let coordinator = Arc::new(ReorderCoordinator::new(Arc::new(RejectingStore)));
    let lifecycle = Lifecycle::new();
    lifecycle.host_initialized.close();

    let triggers = ReorderTriggers::install::<_, ()>(
        coordinator,
        &lifecycle.host_initialized,
        &lifecycle.application_started,
    );
    lifecycle.application_started.fire();

    assert!(triggers.fallback.await.unwrap().is_err());
}

/// Ten routes all tagged with `generation`.
fn generation(generation: usize) -> RouteCollection<usize> {
    (0..10)
        .map(|i| {
            Arc::new(Route::new(
                format!("g{generation}-r{i}"),
                RouteTemplate::parse(&format!("r{i}")).unwrap(),
                generation,
            ))
        })
        .collect()
}

#[test]
fn readers_never_see_a_partial_table() {
    let table = RouteTable::new();
    table.replace(generation(0)).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut reads = 0usize;
                    loop {
                        let routes = table.routes();
                        assert_eq!(routes.len(), 10);
                        let first = *routes[0].target();
                        assert!(routes.iter().all(|r| *r.target() == first));
                        reads += 1;
                        if done.load(Ordering::Acquire) {
                            return reads;
                        }
                    }
                })
            })
            .collect();

        for round in 1..=200 {
            table.replace(generation(round)).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });

    assert!(table.routes().iter().all(|r| *r.target() == 200));
}
