//! The response writer handed to handlers.
//!
//! A [`Response`] owns the connection's [`MessageWriter`] for one request
//! cycle. It works in one of two modes, picked by the headers the handler sets:
//!
//! - **buffered**: [`write`](Response::write) appends to an in-memory body and
//!   [`flush`](Response::flush) serializes head and body in one go, computing
//!   `Content-Length` unless the handler declared one;
//! - **chunked**: after `Transfer-Encoding: chunked` is set,
//!   [`write_chunk`](Response::write_chunk) streams chunks (serializing the
//!   head on first use) and [`end_chunked`](Response::end_chunked) terminates
//!   the stream.
//!
//! The first failed call is kept as a sticky error, whether it was misuse
//! (such as setting a header after the head went out), a framing violation,
//! cancellation or a transport failure. Every later call returns a clone of it
//! without touching the transport, and the connection closes after the handler
//! returns.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use wire_http::handler::HandlerResult;
//! use wire_http::protocol::Request;
//! use wire_http::response::Response;
//!
//! async fn created(request: &Request, response: &mut Response) -> HandlerResult {
//!     response.set_header("Content-Type", "text/plain")?;
//!     response.write_header(StatusCode::CREATED)?;
//!     response.write(b"done")?;
//!     response.flush(Some(request), false).await?;
//!     Ok(())
//! }
//! ```

use bytes::{Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::connection::MessageWriter;
use crate::protocol::{ConnectionType, Message, PayloadItem, PayloadSize, Request, ResponseHead, SendError};
use crate::utils::ensure;

/// Accumulates and serializes one HTTP response.
#[derive(Debug)]
pub struct Response {
    head: ResponseHead,
    body: BytesMut,
    declared_length: Option<u64>,
    chunked: bool,
    header_written: bool,
    committed: bool,
    finished: bool,
    error: Option<SendError>,
    connection: Option<ConnectionType>,
    chunked_connection: ConnectionType,
    writer: MessageWriter,
    connection_token: CancellationToken,
    request_token: Option<CancellationToken>,
}

impl Response {
    /// Creates a response that writes through `writer`.
    ///
    /// `chunked_connection` is announced if the response turns out chunked,
    /// since [`write_chunk`](Self::write_chunk) has no request to negotiate from.
    pub(crate) fn new(
        writer: MessageWriter,
        connection_token: CancellationToken,
        request_token: Option<CancellationToken>,
        chunked_connection: ConnectionType,
    ) -> Self {
        Self {
            head: ResponseHead::default(),
            body: BytesMut::new(),
            declared_length: None,
            chunked: false,
            header_written: false,
            committed: false,
            finished: false,
            error: None,
            connection: None,
            chunked_connection,
            writer,
            connection_token,
            request_token,
        }
    }

    /// Gives the writer back to the connection, discarding anything unsent.
    pub(crate) fn into_writer(mut self) -> MessageWriter {
        self.writer.reset();
        self.writer
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// Whether the response streams its body with chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Whether any part of the response has been handed to the transport.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether the response was completely written, by `flush` or `end_chunked`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The sticky error, if an earlier operation failed terminally.
    pub fn error(&self) -> Option<&SendError> {
        self.error.as_ref()
    }

    /// The connection persistence announced in the head, once the head is serialized.
    pub fn connection(&self) -> Option<ConnectionType> {
        self.connection
    }

    /// Sets a header field, replacing a previous value of the same name.
    ///
    /// `Content-Length` declares the body length that `write` and `flush`
    /// enforce, `Transfer-Encoding: chunked` switches to chunked mode.
    ///
    /// # Errors
    ///
    /// Fails once the head has been written, for names or values that would
    /// break the message framing, and for a non-numeric `Content-Length`.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), SendError> {
        self.check_sticky()?;
        ensure!(!self.header_written, self.fail(SendError::HeadersAlreadyWritten));

        let header_name = HeaderName::from_bytes(name.as_bytes());
        let header_value = HeaderValue::from_str(value);
        let (Ok(header_name), Ok(header_value)) = (header_name, header_value) else {
            return Err(self.fail(SendError::invalid_header(name)));
        };

        if header_name == CONTENT_LENGTH {
            let Ok(length) = value.trim().parse::<u64>() else {
                return Err(self.fail(SendError::invalid_content_length(value)));
            };
            self.declared_length = Some(length);
        } else if header_name == TRANSFER_ENCODING {
            self.chunked = value.trim().eq_ignore_ascii_case("chunked");
        }

        self.head.headers_mut().insert(header_name, header_value);
        Ok(())
    }

    /// Sets the status code. Headers can no longer be changed afterwards.
    ///
    /// # Errors
    ///
    /// Fails if the status or any body was already written.
    pub fn write_header(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.check_sticky()?;
        ensure!(!self.header_written, self.fail(SendError::HeadersAlreadyWritten));

        *self.head.status_mut() = status;
        self.header_written = true;
        Ok(())
    }

    /// Appends `data` to the buffered body. Nothing is sent until [`flush`](Self::flush).
    ///
    /// # Errors
    ///
    /// Fails on a chunked or finished response, when the request was cancelled,
    /// and when the body would grow past a declared `Content-Length`.
    pub fn write(&mut self, data: &[u8]) -> Result<(), SendError> {
        self.check_sticky()?;
        ensure!(!self.chunked, self.fail(SendError::ChunkedResponse));
        ensure!(!self.finished, self.fail(SendError::AlreadyFinished));
        self.check_cancelled().map_err(|e| self.fail(e))?;

        if let Some(declared) = self.declared_length {
            let attempted = (self.body.len() + data.len()) as u64;
            ensure!(attempted <= declared, self.fail(SendError::BodyExceedsContentLength { declared, attempted }));
        }

        self.header_written = true;
        self.body.extend_from_slice(data);
        Ok(())
    }

    /// Serializes the head and the buffered body and flushes the transport.
    ///
    /// The `Connection` header is negotiated from `request` and
    /// `server_wants_close`. Flushing a finished response is a no-op.
    ///
    /// # Errors
    ///
    /// Fails on a chunked response, on cancellation, when the body length
    /// differs from a declared `Content-Length`, for a status code without a
    /// reason phrase, and on transport errors.
    pub async fn flush(&mut self, request: Option<&Request>, server_wants_close: bool) -> Result<(), SendError> {
        self.check_sticky()?;
        if self.finished {
            return Ok(());
        }
        ensure!(!self.chunked, self.fail(SendError::ChunkedResponse));

        let result = self.do_flush(request, server_wants_close).await;
        result.map_err(|e| self.fail(e))
    }

    async fn do_flush(&mut self, request: Option<&Request>, server_wants_close: bool) -> Result<(), SendError> {
        self.check_cancelled()?;
        self.header_written = true;

        let actual = self.body.len() as u64;
        if let Some(declared) = self.declared_length {
            ensure!(declared == actual, SendError::ContentLengthMismatch { declared, actual });
        }

        let connection = ConnectionType::negotiate(request, server_wants_close);
        self.head.headers_mut().insert(CONNECTION, HeaderValue::from_static(connection.as_str()));

        let body = self.body.split().freeze();
        self.writer.write(Message::<_, Bytes>::Header((self.head.clone(), PayloadSize::from_length(actual))))?;
        if !body.is_empty() {
            self.writer.write(Message::<(ResponseHead, PayloadSize)>::from(body))?;
        }

        self.connection = Some(connection);
        self.committed = true;
        self.writer.flush().await?;
        self.finished = true;
        trace!(status = self.head.status().as_u16(), "response flushed");
        Ok(())
    }

    /// Sends one chunk, serializing the head first if it has not gone out yet.
    ///
    /// An empty `data` sends nothing beyond the head.
    ///
    /// # Errors
    ///
    /// Fails on a non-chunked or finished response, on cancellation, and on
    /// transport errors.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<(), SendError> {
        self.check_sticky()?;
        ensure!(self.chunked, self.fail(SendError::NotChunked));
        ensure!(!self.finished, self.fail(SendError::AlreadyFinished));

        let result = self.do_write_chunk(data).await;
        result.map_err(|e| self.fail(e))
    }

    async fn do_write_chunk(&mut self, data: &[u8]) -> Result<(), SendError> {
        self.check_cancelled()?;
        self.write_chunked_head()?;
        self.writer.write(Message::<(ResponseHead, PayloadSize), &[u8]>::Payload(PayloadItem::Chunk(data)))?;
        self.writer.send().await
    }

    /// Terminates a chunked response and flushes the transport.
    ///
    /// # Errors
    ///
    /// Fails on a non-chunked or already finished response, on cancellation,
    /// and on transport errors.
    pub async fn end_chunked(&mut self) -> Result<(), SendError> {
        self.check_sticky()?;
        ensure!(self.chunked, self.fail(SendError::NotChunked));
        ensure!(!self.finished, self.fail(SendError::AlreadyFinished));

        let result = self.do_end_chunked().await;
        result.map_err(|e| self.fail(e))
    }

    async fn do_end_chunked(&mut self) -> Result<(), SendError> {
        self.check_cancelled()?;
        self.write_chunked_head()?;
        self.writer.write(Message::<(ResponseHead, PayloadSize)>::Payload(PayloadItem::Eof))?;
        self.writer.flush().await?;
        self.finished = true;
        trace!(status = self.head.status().as_u16(), "chunked response finished");
        Ok(())
    }

    fn write_chunked_head(&mut self) -> Result<(), SendError> {
        if self.committed {
            return Ok(());
        }

        self.header_written = true;
        let connection = self.chunked_connection;
        self.head.headers_mut().insert(CONNECTION, HeaderValue::from_static(connection.as_str()));
        self.writer.write(Message::<_, Bytes>::Header((self.head.clone(), PayloadSize::Chunked)))?;

        self.connection = Some(connection);
        self.committed = true;
        Ok(())
    }

    fn check_sticky(&self) -> Result<(), SendError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn check_cancelled(&self) -> Result<(), SendError> {
        let request_cancelled = self.request_token.as_ref().is_some_and(CancellationToken::is_cancelled);
        ensure!(!request_cancelled && !self.connection_token.is_cancelled(), SendError::Cancelled);
        Ok(())
    }

    /// Records `e` as the sticky error unless one is already set.
    fn fail(&mut self, e: SendError) -> SendError {
        if self.error.is_none() {
            self.error = Some(e.clone());
        }
        e
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::header::HOST;
    use http::{Method, Version};
    use indoc::indoc;
    use tokio::io::{AsyncReadExt, DuplexStream};

    use super::*;
    use crate::protocol::RequestHeader;

    fn response(connection: ConnectionType) -> (Response, DuplexStream, CancellationToken) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let writer = MessageWriter::with_capacity(server, 1024, Duration::from_secs(1));
        let request_token = CancellationToken::new();
        let response = Response::new(writer, CancellationToken::new(), Some(request_token.clone()), connection);
        (response, client, request_token)
    }

    fn request(version: Version, connection: Option<&str>) -> Request {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("localhost"));
        if let Some(connection) = connection {
            headers.insert(CONNECTION, HeaderValue::from_str(connection).unwrap());
        }
        Request::new(RequestHeader::new(Method::GET, "/", version, headers), Bytes::new())
    }

    async fn received(response: Response, mut client: DuplexStream) -> String {
        drop(response);
        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        received.replace("\r\n", "\n")
    }

    #[tokio::test]
    async fn buffered_response() {
        let (mut response, client, _) = response(ConnectionType::KeepAlive);
        let request = request(Version::HTTP_11, None);

        response.set_header("Content-Type", "text/plain").unwrap();
        response.write(b"WOHOO !!! It is working").unwrap();
        response.flush(Some(&request), false).await.unwrap();

        assert!(response.is_committed());
        assert!(response.is_finished());
        assert_eq!(response.connection(), Some(ConnectionType::KeepAlive));

        let expected = indoc! {"
        HTTP/1.1 200 OK
        content-type: text/plain
        connection: keep-alive
        content-length: 23

        WOHOO !!! It is working"};
        assert_eq!(received(response, client).await, expected);
    }

    #[tokio::test]
    async fn flush_twice_sends_once() {
        let (mut response, client, _) = response(ConnectionType::KeepAlive);
        let request = request(Version::HTTP_10, None);

        response.write_header(StatusCode::CREATED).unwrap();
        response.flush(Some(&request), false).await.unwrap();
        response.flush(Some(&request), false).await.unwrap();
        assert_eq!(response.connection(), Some(ConnectionType::Close));

        assert_eq!(received(response, client).await, "HTTP/1.1 201 Created\nconnection: close\ncontent-length: 0\n\n");
    }

    #[tokio::test]
    async fn declared_length_enforced() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.set_header("Content-Length", "5").unwrap();
        response.write(b"hel").unwrap();
        let result = response.write(b"lo!");
        assert!(matches!(result, Err(SendError::BodyExceedsContentLength { declared: 5, attempted: 6 })));
        assert!(!response.is_committed());

        // sticky from now on
        assert!(matches!(response.write(b"lo"), Err(SendError::BodyExceedsContentLength { .. })));
        assert!(matches!(response.flush(None, false).await, Err(SendError::BodyExceedsContentLength { .. })));
    }

    #[tokio::test]
    async fn declared_length_mismatch_on_flush() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.set_header("content-length", "10").unwrap();
        response.write(b"short").unwrap();
        let result = response.flush(None, false).await;
        assert!(matches!(result, Err(SendError::ContentLengthMismatch { declared: 10, actual: 5 })));
        assert!(!response.is_committed());
        assert!(response.error().is_some());
    }

    #[tokio::test]
    async fn header_misuse() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.write_header(StatusCode::NOT_FOUND).unwrap();
        assert!(matches!(response.write_header(StatusCode::OK), Err(SendError::HeadersAlreadyWritten)));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // misuse sticks like any other failure
        assert!(matches!(response.error(), Some(SendError::HeadersAlreadyWritten)));
        assert!(matches!(response.set_header("X-Late", "1"), Err(SendError::HeadersAlreadyWritten)));
        assert!(matches!(response.write(b"Not Found"), Err(SendError::HeadersAlreadyWritten)));
        assert!(matches!(response.flush(None, false).await, Err(SendError::HeadersAlreadyWritten)));
        assert!(!response.is_committed());
    }

    #[tokio::test]
    async fn invalid_header_fields() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);
        assert!(matches!(response.set_header("Content-Length", "ten"), Err(SendError::InvalidContentLength { .. })));
        assert!(matches!(response.set_header("X-Ok", "1"), Err(SendError::InvalidContentLength { .. })));
        assert!(response.headers().is_empty());

        let (mut response, _client, _) = self::response(ConnectionType::KeepAlive);
        assert!(matches!(response.set_header("X-Evil", "a\r\nSet-Cookie: b"), Err(SendError::InvalidHeader { .. })));
        assert!(matches!(response.error(), Some(SendError::InvalidHeader { .. })));

        let (mut response, _client, _) = self::response(ConnectionType::KeepAlive);
        assert!(matches!(response.set_header("Bad Name", "1"), Err(SendError::InvalidHeader { .. })));
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn header_names_are_case_insensitive() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.set_header("X-Request-Id", "1").unwrap();
        response.set_header("x-request-id", "2").unwrap();
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get("X-REQUEST-ID").unwrap(), "2");
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.write_header(StatusCode::IM_A_TEAPOT).unwrap();
        assert!(matches!(response.flush(None, false).await, Err(SendError::UnknownStatus(418))));
        assert!(!response.is_finished());
    }

    #[tokio::test]
    async fn chunked_response() {
        let (mut response, client, _) = response(ConnectionType::KeepAlive);

        response.set_header("Content-Type", "text/plain").unwrap();
        response.set_header("Transfer-Encoding", "chunked").unwrap();
        assert!(response.is_chunked());

        for chunk in ["Testing\n", "Transfer\n", "Encoding\n"] {
            response.write_chunk(chunk.as_bytes()).await.unwrap();
        }
        response.write_chunk(b"").await.unwrap();
        response.end_chunked().await.unwrap();

        assert!(matches!(response.write_chunk(b"late").await, Err(SendError::AlreadyFinished)));
        assert!(matches!(response.end_chunked().await, Err(SendError::AlreadyFinished)));

        let expected = indoc! {"
        HTTP/1.1 200 OK
        content-type: text/plain
        transfer-encoding: chunked
        connection: keep-alive

        8
        Testing

        9
        Transfer

        9
        Encoding

        0

        "};
        assert_eq!(received(response, client).await, expected);
    }

    #[tokio::test]
    async fn chunk_on_buffered_response() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);
        assert!(matches!(response.write_chunk(b"data").await, Err(SendError::NotChunked)));
        assert!(matches!(response.error(), Some(SendError::NotChunked)));
        assert!(matches!(response.end_chunked().await, Err(SendError::NotChunked)));
        assert!(matches!(response.write(b"data"), Err(SendError::NotChunked)));
    }

    #[tokio::test]
    async fn buffered_write_on_chunked_response() {
        let (mut response, _client, _) = response(ConnectionType::KeepAlive);

        response.set_header("Transfer-Encoding", "chunked").unwrap();
        assert!(matches!(response.write(b"nope"), Err(SendError::ChunkedResponse)));
        assert!(matches!(response.write_chunk(b"data").await, Err(SendError::ChunkedResponse)));
        assert!(matches!(response.flush(None, false).await, Err(SendError::ChunkedResponse)));
        assert!(!response.is_committed());
    }

    #[tokio::test]
    async fn cancelled_request() {
        let (mut response, _client, request_token) = response(ConnectionType::KeepAlive);

        request_token.cancel();
        assert!(matches!(response.write(b"data"), Err(SendError::Cancelled)));
        assert!(matches!(response.flush(None, false).await, Err(SendError::Cancelled)));
        assert!(!response.is_committed());
    }

    #[tokio::test]
    async fn cancelled_connection_stops_chunks() {
        let (client, server) = tokio::io::duplex(1024);
        let writer = MessageWriter::with_capacity(server, 1024, Duration::from_secs(1));
        let connection_token = CancellationToken::new();
        let mut response = Response::new(writer, connection_token.clone(), None, ConnectionType::Close);

        response.set_header("Transfer-Encoding", "chunked").unwrap();
        response.write_chunk(b"first").await.unwrap();
        connection_token.cancel();
        assert!(matches!(response.write_chunk(b"second").await, Err(SendError::Cancelled)));
        assert!(matches!(response.end_chunked().await, Err(SendError::Cancelled)));

        let received = received(response, client).await;
        assert!(received.ends_with("5\nfirst\n"));
        assert!(received.contains("connection: close\n"));
    }

    #[tokio::test]
    async fn transport_failure_is_sticky() {
        let (client, server) = tokio::io::duplex(1024);
        drop(client);
        let writer = MessageWriter::with_capacity(server, 1024, Duration::from_secs(1));
        let mut response = Response::new(writer, CancellationToken::new(), None, ConnectionType::KeepAlive);

        response.set_header("Transfer-Encoding", "chunked").unwrap();
        assert!(matches!(response.write_chunk(b"data").await, Err(SendError::ConnectionClosed)));
        assert!(response.is_committed());
        assert!(matches!(response.error(), Some(SendError::ConnectionClosed)));
        assert!(matches!(response.end_chunked().await, Err(SendError::ConnectionClosed)));
        assert!(matches!(response.set_header("X-After", "1"), Err(SendError::ConnectionClosed)));
    }
}
