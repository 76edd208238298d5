//! Parsed HTTP requests.
//!
//! A [`RequestHeader`] is what the decoder produces from the request head. The
//! connection then attaches the body, the route parameters and a cancellation
//! token to build the [`Request`] handed to handlers.

use bytes::Bytes;
use http::header::AsHeaderName;
use http::{HeaderMap, Method, Version};
use tokio_util::sync::CancellationToken;

use crate::router::PathParams;

/// The request line and header fields of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    method: Method,
    target: String,
    version: Version,
    headers: HeaderMap,
}

impl RequestHeader {
    pub fn new(method: Method, target: impl Into<String>, version: Version, headers: HeaderMap) -> Self {
        Self { method, target: target.into(), version, headers }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target exactly as sent, query string included.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The request target without its query string.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A fully received request, as seen by handlers.
///
/// The body is buffered in full before the handler runs. The cancellation token
/// fires when the request's response cycle ends or the connection goes away.
#[derive(Debug, Clone)]
pub struct Request {
    header: RequestHeader,
    body: Bytes,
    params: PathParams,
    cancellation: CancellationToken,
}

impl Request {
    pub fn new(header: RequestHeader, body: Bytes) -> Self {
        Self { header, body, params: PathParams::new(), cancellation: CancellationToken::new() }
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub(crate) fn set_cancellation_token(&mut self, cancellation: CancellationToken) {
        self.cancellation = cancellation;
    }

    /// The request line and header fields.
    pub fn head(&self) -> &RequestHeader {
        &self.header
    }

    pub fn method(&self) -> &Method {
        self.header.method()
    }

    pub fn target(&self) -> &str {
        self.header.target()
    }

    pub fn path(&self) -> &str {
        self.header.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.header.query()
    }

    pub fn version(&self) -> Version {
        self.header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// Looks a header field up by name, ignoring ASCII case.
    ///
    /// Returns `None` as well for a value that is not visible ASCII.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.header.headers().get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path parameters captured by the matched route.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
