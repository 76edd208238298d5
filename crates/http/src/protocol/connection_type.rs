use http::Version;
use http::header::CONNECTION;

use crate::protocol::Request;

/// Whether the connection stays open after the current response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    KeepAlive,
    Close,
}

impl ConnectionType {
    /// Decides persistence from the request and the server's own intent.
    ///
    /// The connection closes when there is no request to go by, when the server
    /// wants it closed, when the client sent `Connection: close`, or when the
    /// request is HTTP/1.0. Otherwise it is kept alive.
    pub fn negotiate(request: Option<&Request>, server_wants_close: bool) -> Self {
        let Some(request) = request else {
            return ConnectionType::Close;
        };

        if server_wants_close {
            return ConnectionType::Close;
        }

        match request.header(CONNECTION) {
            Some(value) if value.trim().eq_ignore_ascii_case("close") => ConnectionType::Close,
            _ if request.version() == Version::HTTP_10 => ConnectionType::Close,
            _ => ConnectionType::KeepAlive,
        }
    }

    /// The `Connection` header value announcing this choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::KeepAlive => "keep-alive",
            ConnectionType::Close => "close",
        }
    }

    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, ConnectionType::Close)
    }
}
