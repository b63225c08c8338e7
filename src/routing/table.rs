//! The live route table.
//!
//! # Responsibilities
//! - Hold the ordered routes a request is matched against
//! - List (flattened), clear, and bulk-add routes
//! - Look up the first route that fits a request
//!
//! # Design Decisions
//! - Readers take a lock-free snapshot via `ArcSwap`
//! - Writers are serialized by a mutex and publish a whole new collection,
//!   so a reader sees the table before or after a write, never in between
//! - `replace` is a single atomic store, not clear-then-add

use arc_swap::ArcSwap;
use axum::http::Method;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::routing::collection::{Route, RouteCollection, RouteEntry};
use crate::routing::template::RouteValues;

/// Errors raised when the table rejects a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route name '{0}' is already registered")]
    DuplicateName(String),

    #[error("route table rejected the update: {0}")]
    Rejected(String),
}

/// Storage for an ordered set of routes.
///
/// This is the seam between route ordering and whatever owns the routes.
pub trait RouteStore<T>: Send + Sync {
    /// All routes in table order, nested groups flattened.
    fn routes(&self) -> Vec<Arc<Route<T>>>;

    /// Remove every route.
    fn clear(&self) -> Result<(), RouteTableError>;

    /// Append routes after the existing ones.
    fn add_all(&self, routes: RouteCollection<T>) -> Result<(), RouteTableError>;

    /// Replace the table's contents.
    ///
    /// The default runs `clear` then `add_all`. Stores that can be read
    /// concurrently must override this so readers never see the gap.
    fn replace(&self, routes: RouteCollection<T>) -> Result<(), RouteTableError> {
        self.clear()?;
        self.add_all(routes)
    }
}

/// A matched route and the values extracted from the path.
#[derive(Debug)]
pub struct RouteMatch<T> {
    pub route: Arc<Route<T>>,
    pub values: RouteValues,
}

/// Result of looking up a request in the table.
#[derive(Debug)]
pub enum RouteLookup<T> {
    Found(RouteMatch<T>),
    /// The path fits at least one route, but none allows the method.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// In-process route table.
#[derive(Debug)]
pub struct RouteTable<T> {
    current: ArcSwap<RouteCollection<T>>,
    writer: Mutex<()>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteCollection::new()),
            writer: Mutex::new(()),
        }
    }

    /// Register a single route at the end of the table.
    pub fn register(&self, route: Route<T>) -> Result<(), RouteTableError> {
        let mut collection = RouteCollection::new();
        collection.push(route);
        self.append(collection)
    }

    /// Register a nested group at the end of the table.
    pub fn register_group(&self, group: RouteCollection<T>) -> Result<(), RouteTableError> {
        let mut collection = RouteCollection::new();
        collection.push_group(group);
        self.append(collection)
    }

    /// Current contents, as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<RouteCollection<T>> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first route, in table order, that matches the request.
    pub fn find(&self, method: &Method, path: &str) -> RouteLookup<T> {
        let snapshot = self.current.load();
        let mut allowed: Vec<Method> = Vec::new();
        let mut path_matched = false;

        let found = snapshot.walk(&mut |route| {
            let Some(values) = route.template().match_path(path) else {
                return ControlFlow::Continue(());
            };
            if route.allows(method) {
                return ControlFlow::Break(RouteMatch {
                    route: route.clone(),
                    values,
                });
            }
            path_matched = true;
            for m in route.methods() {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
            ControlFlow::Continue(())
        });

        if let ControlFlow::Break(matched) = found {
            RouteLookup::Found(matched)
        } else if path_matched {
            RouteLookup::MethodNotAllowed(allowed)
        } else {
            RouteLookup::NotFound
        }
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>, RouteTableError> {
        self.writer
            .lock()
            .map_err(|_| RouteTableError::Rejected("route table writer lock poisoned".to_string()))
    }

    fn append(&self, routes: RouteCollection<T>) -> Result<(), RouteTableError> {
        let _guard = self.lock_writer()?;
        let current = self.current.load_full();
        check_unique_names(current.flatten().iter().chain(routes.flatten().iter()))?;

        let mut next = (*current).clone();
        for entry in routes.entries() {
            match entry {
                RouteEntry::Route(route) => next.push_shared(route.clone()),
                RouteEntry::Group(group) => next.push_group(group.clone()),
            }
        }
        self.current.store(Arc::new(next));
        Ok(())
    }
}

impl<T: Send + Sync> RouteStore<T> for RouteTable<T> {
    fn routes(&self) -> Vec<Arc<Route<T>>> {
        self.current.load().flatten()
    }

    fn clear(&self) -> Result<(), RouteTableError> {
        let _guard = self.lock_writer()?;
        self.current.store(Arc::new(RouteCollection::new()));
        Ok(())
    }

    fn add_all(&self, routes: RouteCollection<T>) -> Result<(), RouteTableError> {
        self.append(routes)
    }

    fn replace(&self, routes: RouteCollection<T>) -> Result<(), RouteTableError> {
        let _guard = self.lock_writer()?;
        check_unique_names(routes.flatten().iter())?;
        self.current.store(Arc::new(routes));
        tracing::debug!(routes = self.current.load().len(), "Route table replaced");
        Ok(())
    }
}

fn check_unique_names<'a, T: 'a>(
    routes: impl Iterator<Item = &'a Arc<Route<T>>>,
) -> Result<(), RouteTableError> {
    let mut seen = HashSet::new();
    for route in routes {
        if !seen.insert(route.name()) {
            return Err(RouteTableError::DuplicateName(route.name().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::RouteTemplate;

    fn route(name: &str, template: &str) -> Route<&'static str> {
        Route::new(name, RouteTemplate::parse(template).unwrap(), "target")
    }

    #[test]
    fn test_register_and_list() {
        let table = RouteTable::new();
        table.register(route("a", "a")).unwrap();
        let mut group = RouteCollection::named("g");
        group.push(route("b", "b"));
        table.register_group(group).unwrap();

        let names: Vec<_> = table.routes().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_names_rejected_without_change() {
        let table = RouteTable::new();
        table.register(route("a", "a")).unwrap();

        let err = table.register(route("a", "other")).unwrap_err();
        assert_eq!(err, RouteTableError::DuplicateName("a".into()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_clear_then_add_all() {
        let table = RouteTable::new();
        table.register(route("a", "a")).unwrap();
        table.clear().unwrap();
        assert!(table.is_empty());

        let mut routes = RouteCollection::new();
        routes.push(route("a", "a"));
        table.add_all(routes).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_replace_keeps_old_snapshot_intact() {
        let table = RouteTable::new();
        table.register(route("a", "a")).unwrap();
        let before = table.snapshot();

        let mut routes = RouteCollection::new();
        routes.push(route("b", "b"));
        routes.push(route("c", "c"));
        table.replace(routes).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_find_is_first_match_in_table_order() {
        let table = RouteTable::new();
        table.register(route("by-id", "users/{id}")).unwrap();
        table.register(route("me", "users/me")).unwrap();

        match table.find(&Method::GET, "/users/me") {
            RouteLookup::Found(m) => {
                assert_eq!(m.route.name(), "by-id");
                assert_eq!(m.values["id"], "me");
            }
            other => panic!("unexpected lookup: {:?}", other),
        }
    }

    #[test]
    fn test_find_method_not_allowed_and_not_found() {
        let table = RouteTable::new();
        table
            .register(route("create", "items").with_methods(vec![Method::POST]))
            .unwrap();

        match table.find(&Method::GET, "/items") {
            RouteLookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::POST]),
            other => panic!("unexpected lookup: {:?}", other),
        }
        assert!(matches!(table.find(&Method::GET, "/nothing"), RouteLookup::NotFound));
    }
}
