//! Request dispatch against the live route table.
//!
//! # Responsibilities
//! - Look up the first route in table order for each request
//! - Answer with the matched target and route values
//! - Distinguish "no route" (404) from "wrong method" (405)

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{RouteLookup, RouteValues};

/// The dispatch target of a configured route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub target: String,
}

impl Endpoint {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Body returned for a matched request.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub route: String,
    pub template: String,
    pub target: String,
    pub values: RouteValues,
}

/// One row of the admin route listing.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub position: usize,
    pub name: String,
    pub template: String,
    pub methods: Vec<String>,
    pub target: String,
}

/// Catch-all handler: match the request against the table.
pub async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    match state.table.find(&method, &path) {
        RouteLookup::Found(matched) => {
            let route = matched.route;
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = %route.name(),
                "Request dispatched"
            );
            metrics::record_dispatch(200, start);
            Json(DispatchResponse {
                route: route.name().to_string(),
                template: route.template().to_string(),
                target: route.target().target.clone(),
                values: matched.values,
            })
            .into_response()
        }
        RouteLookup::MethodNotAllowed(allowed) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            metrics::record_dispatch(405, start);
            let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
            let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
            response
        }
        RouteLookup::NotFound => {
            tracing::debug!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_dispatch(404, start);
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
    }
}

/// List the live table in match order.
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    let routes = state
        .table
        .snapshot()
        .flatten()
        .iter()
        .enumerate()
        .map(|(position, route)| RouteSummary {
            position,
            name: route.name().to_string(),
            template: route.template().to_string(),
            methods: route.methods().iter().map(|m| m.to_string()).collect(),
            target: route.target().target.clone(),
        })
        .collect();
    Json(routes)
}
