//! Path-pattern routing.
//!
//! Patterns use `{name}` for one segment and `{*name}` for the rest of the
//! path; matched values are handed to the route handler as
//! [`RouteParams`]. A route can be restricted to one method; requests that
//! match no route (or only routes for other methods) get a plain 404.
//!
//! ```no_run
//! use skiff_http::protocol::{Method, Request, Response, StatusCode};
//! use skiff_http::router::{RouteParams, Router};
//!
//! fn show_user(_request: &Request<'_>, params: &RouteParams<'_, '_>) -> Response {
//!     Response::with_body(StatusCode::OK, format!("User #'{}'", params.get("uid").unwrap_or("")))
//! }
//!
//! let router = Router::builder()
//!     .route_method("/users/{uid}", Method::Get, show_user)
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::future::{ready, Ready};

use thiserror::Error;
use tracing::debug;

use crate::handler::Handler;
use crate::protocol::{Method, Request, Response, StatusCode};

/// Parameters captured from the matched pattern.
pub type RouteParams<'k, 'v> = matchit::Params<'k, 'v>;

/// One route's handler. Implemented for plain functions and closures over
/// `(&Request, &RouteParams)`.
pub trait RouteHandler: Send + Sync + 'static {
    fn invoke(&self, request: &Request<'_>, params: &RouteParams<'_, '_>) -> Response;
}

impl<F> RouteHandler for F
where
    F: for<'a, 'b, 'k, 'v> Fn(&'b Request<'a>, &'b RouteParams<'k, 'v>) -> Response
        + Send
        + Sync
        + 'static,
{
    fn invoke(&self, request: &Request<'_>, params: &RouteParams<'_, '_>) -> Response {
        self(request, params)
    }
}

struct Route {
    method: Option<Method>,
    handler: Box<dyn RouteHandler>,
}

/// A [`Handler`] that dispatches on the normalized request path.
pub struct Router {
    inner: matchit::Router<Vec<Route>>,
}

pub struct RouterBuilder {
    routes: Vec<(String, Route)>,
}

#[derive(Debug, Error)]
pub enum RouterBuildError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern { pattern: String, source: matchit::InsertError },
}

impl RouterBuilder {
    fn new() -> RouterBuilder {
        RouterBuilder { routes: Vec::new() }
    }

    /// Registers a route for every method.
    pub fn route(mut self, pattern: impl Into<String>, handler: impl RouteHandler) -> Self {
        self.routes.push((pattern.into(), Route { method: None, handler: Box::new(handler) }));
        self
    }

    /// Registers a route for one method.
    pub fn route_method(
        mut self,
        pattern: impl Into<String>,
        method: Method,
        handler: impl RouteHandler,
    ) -> Self {
        self.routes
            .push((pattern.into(), Route { method: Some(method), handler: Box::new(handler) }));
        self
    }

    pub fn build(self) -> Result<Router, RouterBuildError> {
        // Routes that share a pattern land in one entry, checked in
        // registration order.
        let mut grouped: HashMap<String, Vec<Route>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for (pattern, route) in self.routes {
            if !grouped.contains_key(&pattern) {
                order.push(pattern.clone());
            }
            grouped.entry(pattern).or_default().push(route);
        }

        let mut inner = matchit::Router::new();
        for pattern in order {
            let routes = grouped.remove(&pattern).unwrap_or_default();
            inner
                .insert(pattern.clone(), routes)
                .map_err(|source| RouterBuildError::InvalidPattern { pattern, source })?;
        }
        Ok(Router { inner })
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Dispatches a request, producing 404 when nothing matches.
    pub fn dispatch(&self, request: &Request<'_>) -> Response {
        match self.inner.at(&request.url.path) {
            Ok(matched) => {
                for route in matched.value {
                    if route.method.map_or(true, |method| method == request.method) {
                        return route.handler.invoke(request, &matched.params);
                    }
                }
                not_found()
            }
            Err(_) => {
                debug!(path = %request.url.path, "no matching route");
                not_found()
            }
        }
    }
}

impl Handler for Router {
    type Fut<'a> = Ready<Response> where Self: 'a;

    fn call<'a>(&'a self, request: &'a Request<'a>) -> Self::Fut<'a> {
        ready(self.dispatch(request))
    }
}

fn not_found() -> Response {
    Response::with_body(StatusCode::NOT_FOUND, "Not Found")
}
