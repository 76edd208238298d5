//! HTTP head processing.
//!
//! - [`HeaderDecoder`]: parses and validates request heads, enforcing the
//!   head size limit and deciding the body framing.
//! - [`HeaderEncoder`]: serializes response heads with the fixed reason
//!   phrase table and the payload framing field.

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
pub(crate) use header_encoder::FastWrite;
