//! Request handlers.
//!
//! A [`Handler`] receives the parsed [`Request`] and an empty [`Response`] and
//! is responsible for producing output through the response API before it
//! returns. Plain async functions become handlers through [`make_handler`]:
//!
//! ```
//! use wire_http::handler::{make_handler, HandlerResult};
//! use wire_http::protocol::Request;
//! use wire_http::response::Response;
//!
//! async fn hello(request: &Request, response: &mut Response) -> HandlerResult {
//!     response.write(b"hello")?;
//!     response.flush(Some(request), false).await?;
//!     Ok(())
//! }
//!
//! let handler = make_handler(hello);
//! # let _ = handler;
//! ```

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;

use crate::protocol::Request;
use crate::response::Response;

/// Error type handlers may fail with.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: &Request, response: &mut Response) -> HandlerResult;
}

/// An async function borrowing the request and response for `'a`.
///
/// Implemented for every `async fn(&Request, &mut Response) -> HandlerResult`,
/// it lets the returned future borrow both arguments.
pub trait AsyncHandlerFn<'a>: Send + Sync {
    type Future: Future<Output = HandlerResult> + Send + 'a;

    fn call(&self, request: &'a Request, response: &'a mut Response) -> Self::Future;
}

impl<'a, F, Fut> AsyncHandlerFn<'a> for F
where
    F: Fn(&'a Request, &'a mut Response) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'a,
{
    type Future = Fut;

    fn call(&self, request: &'a Request, response: &'a mut Response) -> Self::Future {
        (self)(request, response)
    }
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> AsyncHandlerFn<'a>,
{
    async fn call(&self, request: &Request, response: &mut Response) -> HandlerResult {
        AsyncHandlerFn::call(&self.f, request, response).await
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> AsyncHandlerFn<'a>,
{
    HandlerFn { f }
}
