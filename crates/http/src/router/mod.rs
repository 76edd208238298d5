//! Method + path routing over a segment trie.
//!
//! Routes are registered through a [`RouterBuilder`] before serving; building
//! performs every insertion and reports the first malformed or conflicting
//! route. The resulting [`Router`] is immutable and shared by all connections.
//!
//! Route patterns are made of `/`-separated segments:
//!
//! - `static` matches that literal segment,
//! - `:name` matches any single segment and binds it to `name`,
//! - `*name` (last segment only) matches the remaining segments, joined by `/`.
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use wire_http::handler::HandlerResult;
//! use wire_http::protocol::Request;
//! use wire_http::response::Response;
//! use wire_http::router::{get, Router};
//!
//! async fn user(request: &Request, response: &mut Response) -> HandlerResult {
//!     response.write(format!("Id {}", request.param("id").unwrap_or_default()).as_bytes())?;
//!     response.flush(Some(request), false).await?;
//!     Ok(())
//! }
//!
//! let router = Router::builder().route("/api/param/:id", get(user)).build().unwrap();
//!
//! let matched = router.at(&Method::GET, "/api/param/42").unwrap();
//! assert_eq!(matched.params().get("id"), Some("42"));
//! assert!(router.at(&Method::POST, "/api/param/42").is_err());
//! ```

mod node;
mod params;

use http::Method;
use thiserror::Error;
use tracing::debug;

use crate::handler::{AsyncHandlerFn, Handler, make_handler};
use node::{Node, split_path};
pub use params::PathParams;

/// Errors raised while building a router or matching a request against it.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route path must start with '/': {path:?}")]
    InvalidPath { path: String },

    #[error("route path contains an empty segment: {path}")]
    EmptySegment { path: String },

    #[error("parameter or wildcard without a name: {path}")]
    EmptyParamName { path: String },

    #[error("wildcard must be the last segment: {path}")]
    WildcardNotLast { path: String },

    #[error("parameter in {path} conflicts with existing {existing}")]
    ConflictingParam { path: String, existing: String },

    #[error("wildcard in {path} conflicts with existing {existing}")]
    ConflictingWildcard { path: String, existing: String },

    #[error("route already registered: {method} {path}")]
    DuplicateRoute { method: Method, path: String },

    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },
}

impl RouteError {
    pub fn invalid_path<S: ToString>(path: S) -> Self {
        Self::InvalidPath { path: path.to_string() }
    }

    pub fn empty_segment<S: ToString>(path: S) -> Self {
        Self::EmptySegment { path: path.to_string() }
    }

    pub fn empty_param_name<S: ToString>(path: S) -> Self {
        Self::EmptyParamName { path: path.to_string() }
    }

    pub fn not_found<S: ToString>(method: &Method, path: S) -> Self {
        Self::NotFound { method: method.clone(), path: path.to_string() }
    }
}

/// Immutable routing table.
#[derive(Debug)]
pub struct Router {
    root: Node,
}

/// A successful lookup: the handler and the parameters bound along the way.
pub struct RouteMatch<'router> {
    handler: &'router dyn Handler,
    params: PathParams,
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch").field("params", &self.params).finish_non_exhaustive()
    }
}

impl<'router> RouteMatch<'router> {
    pub fn handler(&self) -> &'router dyn Handler {
        self.handler
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (&'router dyn Handler, PathParams) {
        (self.handler, self.params)
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Resolves the handler for `method` and `path`.
    ///
    /// `path` is matched as given, callers strip the query string first.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPath`] or [`RouteError::EmptySegment`] for
    /// a malformed path and [`RouteError::NotFound`] when nothing matches.
    pub fn at(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RouteError> {
        let segments = split_path(path)?;
        match self.root.search(method, &segments) {
            Some((handler, params)) => Ok(RouteMatch { handler, params }),
            None => {
                debug!(%method, path, "no route matched");
                Err(RouteError::not_found(method, path))
            }
        }
    }
}

/// A handler bound to a method, see [`get`], [`post`] and friends.
pub struct MethodHandler {
    method: Method,
    handler: Box<dyn Handler>,
}

impl std::fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandler").field("method", &self.method).finish_non_exhaustive()
    }
}

impl MethodHandler {
    pub fn new<H: Handler + 'static>(method: Method, handler: H) -> Self {
        Self { method, handler: Box::new(handler) }
    }
}

/// Collects routes; [`build`](RouterBuilder::build) inserts them in registration order.
#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<(String, MethodHandler)>,
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.routes.iter().map(|(path, item)| (&item.method, path))).finish()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn route(mut self, path: impl Into<String>, method_handler: MethodHandler) -> Self {
        self.routes.push((path.into(), method_handler));
        self
    }

    /// Registers `handler` for `method` and `path`.
    #[must_use]
    pub fn register<H: Handler + 'static>(self, method: Method, path: impl Into<String>, handler: H) -> Self {
        self.route(path, MethodHandler::new(method, handler))
    }

    /// Builds the trie.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteError`] raised by a malformed or conflicting route.
    pub fn build(self) -> Result<Router, RouteError> {
        let mut root = Node::default();
        for (path, MethodHandler { method, handler }) in self.routes {
            root.insert(method, &path, handler)?;
        }
        Ok(Router { root })
    }
}

macro_rules! method_router {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Binds an async fn to `", stringify!($method), "` requests.")]
        pub fn $name<F>(f: F) -> MethodHandler
        where
            F: for<'a> AsyncHandlerFn<'a> + 'static,
        {
            MethodHandler::new(Method::$method, make_handler(f))
        }
    };
}

method_router!(get, GET);
method_router!(post, POST);
method_router!(put, PUT);
method_router!(delete, DELETE);
method_router!(head, HEAD);
method_router!(options, OPTIONS);
method_router!(patch, PATCH);
