//! TCP bootstrap for `wire-http`.
//!
//! [`Server`] binds a listener, accepts connections and spawns one task per
//! connection running [`HttpConnection::serve`](wire_http::connection::HttpConnection::serve).
//! Routing, parsing and response writing all live in `wire-http`, re-exported
//! here so an application only needs this crate:
//!
//! ```no_run
//! use wire_web::handler::HandlerResult;
//! use wire_web::router::{Router, get};
//! use wire_web::{Request, Response, Server};
//!
//! async fn hello(request: &Request, response: &mut Response) -> HandlerResult {
//!     response.write(b"hello world")?;
//!     response.flush(Some(request), false).await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder().route("/", get(hello)).build()?;
//!     Server::builder().address("127.0.0.1:3000").router(router).build()?.start().await?;
//!     Ok(())
//! }
//! ```

mod server;

pub use server::{Server, ServerBuildError, ServerBuilder, ServerError};

pub use wire_http::config::{self, Config};
pub use wire_http::protocol::Request;
pub use wire_http::response::{self, Response};
pub use wire_http::{Method, StatusCode, Version, handler, router};
