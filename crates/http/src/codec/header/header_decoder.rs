//! HTTP request head decoder.
//!
//! Splits the request line and header fields off the read buffer once the
//! blank line terminating the head has arrived, validates them, and decides
//! how the body that follows is framed.
//!
//! The search for the terminator resumes where the previous attempt stopped,
//! so a head trickling in over many reads is scanned once. The head size limit
//! is enforced both while waiting for the terminator and on the complete head.

use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, Entry, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use memchr::memmem;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::config::Config;
use crate::protocol::{ParseError, PayloadSize, RequestHeader};
use crate::utils::ensure;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const LINE_SEPARATOR: &str = "\r\n";
const MAX_TARGET_LEN: usize = 8192;

/// Decoder for request heads implementing the [`Decoder`] trait.
///
/// Produces the parsed [`RequestHeader`] together with the [`PayloadSize`] of
/// the body that follows it.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    header_limit: usize,
    body_limit: usize,
    /// bytes of the buffer already searched for the terminator
    scanned: usize,
}

impl HeaderDecoder {
    pub fn new(header_limit: usize, body_limit: usize) -> Self {
        Self { header_limit, body_limit, scanned: 0 }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.header_limit(), config.body_limit())
    }
}

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // the terminator may straddle the previous scan boundary
        let search_from = self.scanned.saturating_sub(HEAD_TERMINATOR.len() - 1).min(src.len());

        let Some(position) = memmem::find(&src[search_from..], HEAD_TERMINATOR).map(|index| index + search_from) else {
            ensure!(src.len() <= self.header_limit, ParseError::header_too_large(src.len(), self.header_limit));
            self.scanned = src.len();
            return Ok(None);
        };
        self.scanned = 0;

        let head_size = position + HEAD_TERMINATOR.len();
        trace!(head_size, "found request head terminator");
        ensure!(head_size <= self.header_limit, ParseError::header_too_large(head_size, self.header_limit));

        let head_bytes = src.split_to(head_size);
        let head = std::str::from_utf8(&head_bytes[..position]).map_err(|_| ParseError::InvalidEncoding)?;

        let (request_line, header_lines) = head.split_once(LINE_SEPARATOR).unwrap_or((head, ""));
        let (method, target, version) = parse_request_line(request_line)?;
        let headers = parse_header_lines(header_lines)?;

        // HTTP/1.1 requires Host; HTTP/1.0 does not
        ensure!(version != Version::HTTP_11 || headers.contains_key(HOST), ParseError::MissingHostHeader);

        let payload_size = parse_payload(&headers, self.body_limit)?;
        let header = RequestHeader::new(method, target, version, headers);

        Ok(Some((header, payload_size)))
    }
}

/// Parses `METHOD SP TARGET SP VERSION`, tolerating extra whitespace between tokens.
fn parse_request_line(line: &str) -> Result<(Method, &str, Version), ParseError> {
    let mut parts = line.split_ascii_whitespace();
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::malformed_request_line(line));
    };

    let method = parse_method(method)?;
    ensure!(target.starts_with('/') || target == "*", ParseError::invalid_path(target));
    ensure!(target.len() <= MAX_TARGET_LEN, ParseError::invalid_path("request target too long"));
    ensure!(!target.contains('\0'), ParseError::invalid_path("request target contains NUL"));
    let version = parse_version(version)?;

    Ok((method, target, version))
}

fn parse_method(method: &str) -> Result<Method, ParseError> {
    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        "PATCH" => Method::PATCH,
        _ => return Err(ParseError::invalid_method(method)),
    };
    Ok(method)
}

fn parse_version(version: &str) -> Result<Version, ParseError> {
    match version {
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        _ => Err(ParseError::unsupported_version(version)),
    }
}

fn parse_header_lines(lines: &str) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::with_capacity(16);
    for line in lines.split(LINE_SEPARATOR).filter(|line| !line.is_empty()) {
        let Some((name, value)) = split_header_line(line) else {
            trace!(line, "skip header line without name");
            continue;
        };

        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ParseError::invalid_header(name))?;
        let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| ParseError::invalid_header(name))?;

        match headers.entry(header_name) {
            Entry::Occupied(entry) => return Err(ParseError::duplicate_header(entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(header_value);
            }
        }
    }
    Ok(headers)
}

/// Splits a header line on its first colon into the trimmed name and value.
///
/// Returns `None` for a line without a colon or with an empty name.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Decides how the body is framed from `Content-Length` and `Transfer-Encoding`.
fn parse_payload(headers: &HeaderMap, body_limit: usize) -> Result<PayloadSize, ParseError> {
    let content_length = headers.get(CONTENT_LENGTH);
    let transfer_encoding = headers.get(TRANSFER_ENCODING);

    match (transfer_encoding, content_length) {
        (Some(_), Some(_)) => Err(ParseError::AmbiguousBodyLength),
        (Some(_), None) => Err(ParseError::ChunkedRequestUnsupported),
        (None, None) => Ok(PayloadSize::Empty),
        (None, Some(value)) => {
            let length = value
                .to_str()
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .ok_or_else(|| ParseError::invalid_content_length(String::from_utf8_lossy(value.as_bytes())))?;
            ensure!(length <= body_limit as u64, ParseError::body_too_large(length, body_limit));
            Ok(PayloadSize::from_length(length))
        }
    }
}
