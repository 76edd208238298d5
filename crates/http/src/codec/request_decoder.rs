//! HTTP request decoder.
//!
//! [`RequestDecoder`] turns a byte stream into complete requests: the head is
//! parsed by [`HeaderDecoder`], then a `Content-Length` body is collected by a
//! [`LengthDecoder`]. It is meant to be driven by a
//! [`FramedRead`](tokio_util::codec::FramedRead), which keeps bytes read past
//! one request buffered for the next.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use wire_http::codec::RequestDecoder;
//! use wire_http::config::Config;
//!
//! let mut decoder = RequestDecoder::new(&Config::default());
//! let mut buffer = BytesMut::from("POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nhi");
//!
//! let (header, body) = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(header.path(), "/echo");
//! assert_eq!(&body[..], b"hi");
//! ```

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::body::LengthDecoder;
use crate::codec::header::HeaderDecoder;
use crate::config::Config;
use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// A decoder for whole HTTP requests.
///
/// The decoder is in one of two states, tracked by `pending_body`:
/// - `None`: waiting for a request head
/// - `Some(..)`: head parsed, waiting for the rest of its body
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    pending_body: Option<(RequestHeader, LengthDecoder)>,
}

impl RequestDecoder {
    pub fn new(config: &Config) -> Self {
        Self { header_decoder: HeaderDecoder::from_config(config), pending_body: None }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = (RequestHeader, Bytes);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some((header, mut body_decoder)) = self.pending_body.take() {
            return match body_decoder.decode(src)? {
                Some(body) => Ok(Some((header, body))),
                None => {
                    self.pending_body = Some((header, body_decoder));
                    Ok(None)
                }
            };
        }

        match self.header_decoder.decode(src)? {
            Some((header, PayloadSize::Length(length))) => {
                self.pending_body = Some((header, LengthDecoder::new(length)));
                self.decode(src)
            }
            Some((header, _)) => Ok(Some((header, Bytes::new()))),
            None => Ok(None),
        }
    }

    /// A stream ending between requests is a clean close, anywhere else it cut a request short.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() && self.pending_body.is_none() => Ok(None),
            None => Err(ParseError::ConnectionClosed),
        }
    }
}
