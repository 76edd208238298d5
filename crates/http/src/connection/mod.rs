//! Connection handling.
//!
//! - [`HttpConnection`] drives the request cycles of one accepted stream:
//!   read a request, route it, run the handler, then loop or close.
//! - [`MessageWriter`] is the buffered, timeout-bounded write half that a
//!   [`Response`](crate::response::Response) borrows for one cycle.

mod http_connection;
mod message_writer;

pub use http_connection::HttpConnection;
pub use message_writer::{BoxWriter, MessageWriter};
