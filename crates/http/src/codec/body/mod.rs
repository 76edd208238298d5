//! Body framing for requests and responses.
//!
//! Requests carry `Content-Length` bodies only, decoded by [`LengthDecoder`].
//! Responses are encoded by [`PayloadEncoder`], which frames the payload with
//! either a fixed length or chunked transfer encoding.

mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_encoder;

pub use length_decoder::LengthDecoder;
pub use payload_encoder::PayloadEncoder;
