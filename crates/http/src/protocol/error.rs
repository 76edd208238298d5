use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: Box<dyn Error + Send + Sync> },
}

impl HttpError {
    pub fn handler(source: Box<dyn Error + Send + Sync>) -> Self {
        Self::HandlerError { source }
    }
}

/// Errors produced while reading and validating one request.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("invalid http method: {method}")]
    InvalidMethod { method: String },

    #[error("invalid request path: {reason}")]
    InvalidPath { reason: String },

    #[error("unsupported http version: {version}")]
    UnsupportedVersion { version: String },

    #[error("invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("duplicate header: {name}")]
    DuplicateHeader { name: String },

    #[error("HTTP/1.1 request requires a host header")]
    MissingHostHeader,

    #[error("content-length and transfer-encoding both present in headers")]
    AmbiguousBodyLength,

    #[error("transfer-encoding request bodies are not supported")]
    ChunkedRequestUnsupported,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body size too large, declared: {declared} exceed the limit {max_size}")]
    BodyTooLarge { declared: u64, max_size: usize },

    #[error("request head is not valid utf-8")]
    InvalidEncoding,

    #[error("connection closed before the request was complete")]
    ConnectionClosed,

    #[error("request not received within {0:?}")]
    Timeout(Duration),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn malformed_request_line<S: ToString>(str: S) -> Self {
        Self::MalformedRequestLine { reason: str.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_path<S: ToString>(str: S) -> Self {
        Self::InvalidPath { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn invalid_header<S: ToString>(name: S) -> Self {
        Self::InvalidHeader { name: name.to_string() }
    }

    pub fn duplicate_header<S: ToString>(name: S) -> Self {
        Self::DuplicateHeader { name: name.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn body_too_large(declared: u64, max_size: usize) -> Self {
        Self::BodyTooLarge { declared, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the transport failed, as opposed to the peer sending a bad message.
    ///
    /// Nothing is written back for transport failures except a timeout, which
    /// still gets a `408` on a best-effort basis.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Timeout(_) | Self::Io { .. })
    }

    /// The status code reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors produced by the response writer.
///
/// The writer keeps the first error it hits and hands out clones of
/// it for every later call, which is why I/O sources are shared through `Arc`.
#[derive(Error, Debug, Clone)]
pub enum SendError {
    #[error("headers already written")]
    HeadersAlreadyWritten,

    #[error("invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("invalid content-length header: {value}")]
    InvalidContentLength { value: String },

    #[error("response is chunked, use write_chunk and end_chunked")]
    ChunkedResponse,

    #[error("response is not chunked, use write and flush")]
    NotChunked,

    #[error("body exceeds content-length, declared: {declared}, attempted: {attempted}")]
    BodyExceedsContentLength { declared: u64, attempted: u64 },

    #[error("body length {actual} does not match content-length {declared}")]
    ContentLengthMismatch { declared: u64, actual: u64 },

    #[error("unsupported status code {0}")]
    UnknownStatus(u16),

    #[error("response already finished")]
    AlreadyFinished,

    #[error("response cancelled")]
    Cancelled,

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("response not written within {0:?}")]
    Timeout(Duration),

    #[error("io error: {source}")]
    Io { source: Arc<io::Error> },
}

impl SendError {
    pub fn invalid_header<S: ToString>(name: S) -> Self {
        Self::InvalidHeader { name: name.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(value: S) -> Self {
        Self::InvalidContentLength { value: value.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        e.into().into()
    }

    /// Whether this error came from the transport rather than from misuse of the writer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Timeout(_) | Self::Io { .. })
    }
}

impl From<io::Error> for SendError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::WriteZero => Self::ConnectionClosed,
            _ => Self::Io { source: Arc::new(e) },
        }
    }
}
