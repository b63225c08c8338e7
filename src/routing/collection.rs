//! Routes and nested route collections.

use axum::http::Method;
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::routing::template::RouteTemplate;

/// A registered route: a template plus the target it dispatches to.
///
/// The target is opaque to ordering and matching.
#[derive(Debug)]
pub struct Route<T> {
    name: String,
    template: RouteTemplate,
    methods: Vec<Method>,
    target: T,
}

impl<T> Route<T> {
    pub fn new(name: impl Into<String>, template: RouteTemplate, target: T) -> Self {
        Self {
            name: name.into(),
            template,
            methods: Vec::new(),
            target,
        }
    }

    /// Restrict the route to the given methods. An empty list allows any method.
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// An entry in a route collection.
#[derive(Debug)]
pub enum RouteEntry<T> {
    Route(Arc<Route<T>>),
    Group(RouteCollection<T>),
}

impl<T> Clone for RouteEntry<T> {
    fn clone(&self) -> Self {
        match self {
            RouteEntry::Route(route) => RouteEntry::Route(route.clone()),
            RouteEntry::Group(group) => RouteEntry::Group(group.clone()),
        }
    }
}

/// An ordered collection of routes, possibly containing nested groups.
#[derive(Debug)]
pub struct RouteCollection<T> {
    name: Option<String>,
    entries: Vec<RouteEntry<T>>,
}

// Manual impl: cloning only bumps the route Arcs, so `T` need not be Clone.
impl<T> Clone for RouteCollection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for RouteCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteCollection<T> {
    pub fn new() -> Self {
        Self {
            name: None,
            entries: Vec::new(),
        }
    }

    /// A named group, used for nesting.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn entries(&self) -> &[RouteEntry<T>] {
        &self.entries
    }

    pub fn push(&mut self, route: Route<T>) {
        self.entries.push(RouteEntry::Route(Arc::new(route)));
    }

    pub fn push_shared(&mut self, route: Arc<Route<T>>) {
        self.entries.push(RouteEntry::Route(route));
    }

    pub fn push_group(&mut self, group: RouteCollection<T>) {
        self.entries.push(RouteEntry::Group(group));
    }

    /// Number of routes, counting into nested groups.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                RouteEntry::Route(_) => 1,
                RouteEntry::Group(group) => group.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All routes in order, with nested groups expanded in place.
    pub fn flatten(&self) -> Vec<Arc<Route<T>>> {
        let mut routes = Vec::with_capacity(self.len());
        self.flatten_into(&mut routes);
        routes
    }

    fn flatten_into(&self, out: &mut Vec<Arc<Route<T>>>) {
        let _ = self.walk(&mut |route| {
            out.push(route.clone());
            ControlFlow::<()>::Continue(())
        });
    }

    /// Visit routes in flattened order without collecting them, stopping at
    /// the first `Break`.
    pub fn walk<B, F>(&self, f: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&Arc<Route<T>>) -> ControlFlow<B>,
    {
        for entry in &self.entries {
            match entry {
                RouteEntry::Route(route) => f(route)?,
                RouteEntry::Group(group) => group.walk(f)?,
            }
        }
        ControlFlow::Continue(())
    }
}

impl<T> FromIterator<Arc<Route<T>>> for RouteCollection<T> {
    fn from_iter<I: IntoIterator<Item = Arc<Route<T>>>>(iter: I) -> Self {
        Self {
            name: None,
            entries: iter.into_iter().map(RouteEntry::Route).collect(),
        }
    }
}
