//! Decoder for request bodies framed by `Content-Length`.
//!
//! The body is accumulated in place in the read buffer and split off in one
//! piece once every declared byte has arrived, so a body costs no copy and
//! the decoder never takes bytes belonging to the next request.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::protocol::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// declared body length in bytes
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // lengths are capped by the body limit before a decoder is created
        let length = usize::try_from(self.length).map_err(|_| ParseError::invalid_content_length(self.length))?;

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        Ok(Some(src.split_to(length).freeze()))
    }
}
