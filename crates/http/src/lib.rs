//! A small asynchronous HTTP/1.x server core
//!
//! This crate reads HTTP/1.0 and HTTP/1.1 requests from any tokio stream,
//! routes them through a path trie and lets handlers write responses through
//! an explicit writer API. It is the engine under `wire-web`, which only adds
//! the TCP accept loop.
//!
//! # Features
//!
//! - Request parsing with size limits on the head and the body
//! - `Content-Length` framed request bodies, read in full before dispatch
//! - Buffered and chunked responses
//! - Keep-alive negotiation following the request version and `Connection` header
//! - Static, `:param` and `*wildcard` route segments
//! - Per-request and per-connection cancellation
//! - Read and write deadlines
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio::net::TcpListener;
//! use tracing::{Level, info, warn};
//! use tracing_subscriber::FmtSubscriber;
//! use wire_http::config::Config;
//! use wire_http::connection::HttpConnection;
//! use wire_http::handler::HandlerResult;
//! use wire_http::protocol::Request;
//! use wire_http::response::Response;
//! use wire_http::router::{Router, get};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     let router = Arc::new(Router::builder().route("/hello/:name", get(hello)).build()?);
//!     let config = Arc::new(Config::default());
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     info!(port = 8080, "start listening");
//!     loop {
//!         let (stream, _remote_addr) = match listener.accept().await {
//!             Ok(accepted) => accepted,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let (reader, writer) = stream.into_split();
//!         let connection = HttpConnection::new(reader, writer, Arc::clone(&config));
//!         tokio::spawn(connection.serve(Arc::clone(&router)));
//!     }
//! }
//!
//! async fn hello(request: &Request, response: &mut Response) -> HandlerResult {
//!     let body = format!("Hello {}!", request.param("name").unwrap_or("world"));
//!     response.set_header("Content-Type", "text/plain; charset=utf-8")?;
//!     response.write(body.as_bytes())?;
//!     response.flush(Some(request), false).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`config`]: buffer sizes, limits and deadlines
//! - [`codec`]: request decoding and response encoding
//! - [`protocol`]: request, response and error types
//! - [`router`]: the route trie
//! - [`handler`]: the handler trait and async fn adapters
//! - [`response`]: the response writer handed to handlers
//! - [`connection`]: the per-connection request loop
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: the request could not be read, answered with `400` or `408`
//! - [`protocol::SendError`]: the response could not be written
//! - [`router::RouteError`]: a route could not be registered or matched
//! - [`protocol::HttpError`]: why a connection ended
//!
//! # Limitations
//!
//! - HTTP/1.x only, without TLS
//! - Request bodies with `Transfer-Encoding` are rejected
//! - No pipelined responses: requests on one connection are served one at a time

pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod response;
pub mod router;

mod utils;

pub use http::{Method, StatusCode, Version};
