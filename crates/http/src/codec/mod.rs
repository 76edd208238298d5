//! Codecs between raw bytes and HTTP messages.
//!
//! - Requests: [`RequestDecoder`] yields whole requests, the head parsed by the
//!   [`header`] decoder and a `Content-Length` body collected by the [`body`]
//!   decoder.
//! - Responses: [`ResponseEncoder`] serializes a head followed by payload
//!   items, framed by length or by chunked transfer encoding.
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use tokio_util::codec::Encoder;
//! use wire_http::codec::ResponseEncoder;
//! use wire_http::protocol::{Message, PayloadSize, ResponseHead};
//!
//! let mut encoder = ResponseEncoder::new();
//! let mut buffer = BytesMut::new();
//!
//! let head = Message::<_, Bytes>::Header((ResponseHead::default(), PayloadSize::Length(2)));
//! encoder.encode(head, &mut buffer).unwrap();
//! encoder.encode(Message::<(ResponseHead, PayloadSize)>::from(Bytes::from_static(b"ok")), &mut buffer).unwrap();
//!
//! assert_eq!(&buffer[..], b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok");
//! ```

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
