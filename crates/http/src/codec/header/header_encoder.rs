//! HTTP response head encoder.
//!
//! Serializes the status line and header fields of a response, adding the
//! `Content-Length` or `Transfer-Encoding` field that frames the payload.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::HeaderValue;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{PayloadSize, ResponseHead, SendError, reason_phrase};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// Encoder for response heads implementing the [`Encoder`] trait.
///
/// A status code outside the supported table is rejected before anything is
/// written to `dst`.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        let status = head.status();
        let Some(reason) = reason_phrase(status) else {
            error!(status = status.as_u16(), "unsupported status code");
            return Err(SendError::UnknownStatus(status.as_u16()));
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason)?;

        // explicit framing set by the handler wins, it has already been validated
        match payload_size {
            PayloadSize::Length(n) => {
                head.headers_mut().entry(CONTENT_LENGTH).or_insert_with(|| HeaderValue::from(n));
            }
            PayloadSize::Chunked => {
                head.headers_mut().remove(CONTENT_LENGTH);
                head.headers_mut().insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
            PayloadSize::Empty => {
                head.headers_mut().entry(CONTENT_LENGTH).or_insert_with(|| HeaderValue::from_static("0"));
            }
        }

        for (name, value) in head.headers() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use http::header::{CONNECTION, CONTENT_TYPE};
    use indoc::indoc;

    use super::*;

    fn head(status: StatusCode) -> ResponseHead {
        let mut head = ResponseHead::default();
        *head.status_mut() = status;
        head
    }

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap().replace("\r\n", "\n")
    }

    #[test]
    fn fixed_length_head() {
        let mut head = head(StatusCode::OK);
        head.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        head.headers_mut().insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let expected = indoc! {"
        HTTP/1.1 200 OK
        content-type: text/plain
        connection: keep-alive
        content-length: 23

        "};
        assert_eq!(encode(head, PayloadSize::Length(23)), expected);
    }

    #[test]
    fn chunked_head_drops_content_length() {
        let mut head = head(StatusCode::OK);
        head.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        head.headers_mut().insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let expected = indoc! {"
        HTTP/1.1 200 OK
        transfer-encoding: chunked

        "};
        assert_eq!(encode(head, PayloadSize::Chunked), expected);
    }

    #[test]
    fn empty_body_head() {
        assert_eq!(encode(head(StatusCode::CREATED), PayloadSize::Empty), "HTTP/1.1 201 Created\ncontent-length: 0\n\n");

        let mut declared = head(StatusCode::OK);
        declared.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert_eq!(encode(declared, PayloadSize::Empty), "HTTP/1.1 200 OK\ncontent-length: 0\n\n");
    }

    #[test]
    fn unknown_status() {
        let mut dst = BytesMut::new();
        let result = HeaderEncoder.encode((head(StatusCode::IM_A_TEAPOT), PayloadSize::Empty), &mut dst);
        assert!(matches!(result, Err(SendError::UnknownStatus(418))));
        assert!(dst.is_empty());
    }
}
