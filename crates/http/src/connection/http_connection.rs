use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::codec::RequestDecoder;
use crate::config::Config;
use crate::connection::MessageWriter;
use crate::protocol::{ConnectionType, HttpError, ParseError, Request, SendError, reason_phrase};
use crate::response::Response;
use crate::router::Router;
use crate::utils::panic_message;

/// Serves the requests arriving on one connection, one after the other.
///
/// Every cycle reads a complete request, routes it, runs the matched handler
/// with a fresh [`Response`] and then either waits for the next request or
/// closes. The connection closes after a malformed request (`400`), a read
/// timeout (`408`), a handler error (`500` when nothing was sent yet), a
/// failed write, a response the handler left unfinished, or when either side
/// asked for `Connection: close`.
///
/// # Type Parameters
///
/// * `R`: The async readable half of the stream
pub struct HttpConnection<R> {
    framed_read: FramedRead<R, RequestDecoder>,
    message_writer: MessageWriter,
    config: Arc<Config>,
    cancellation: CancellationToken,
}

impl<R> fmt::Debug for HttpConnection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("message_writer", &self.message_writer)
            .field("config", &self.config)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<R> HttpConnection<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new<W>(reader: R, writer: W, config: Arc<Config>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::with_cancellation(reader, writer, config, CancellationToken::new())
    }

    /// Creates a connection whose token is `cancellation`, usually a child of a server-wide token.
    ///
    /// The token is cancelled when the connection ends, whichever way it ends.
    pub fn with_cancellation<W>(reader: R, writer: W, config: Arc<Config>, cancellation: CancellationToken) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(&config), config.buffer_size()),
            message_writer: MessageWriter::with_capacity(writer, config.buffer_size(), config.write_timeout()),
            config,
            cancellation,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Runs request cycles until the connection closes.
    ///
    /// Returns `Ok` when the peer went away between requests, when a response
    /// negotiated `Connection: close`, or when the connection was cancelled
    /// while idle.
    ///
    /// # Errors
    ///
    /// Returns the [`HttpError`] that ended the connection: a request that
    /// could not be read, a response that could not be written, or a handler
    /// failure.
    pub async fn process(self, router: Arc<Router>) -> Result<(), HttpError> {
        let Self { mut framed_read, mut message_writer, config, cancellation } = self;
        let _connection_guard = cancellation.clone().drop_guard();

        loop {
            let next = select! {
                biased;
                () = cancellation.cancelled() => {
                    info!("connection cancelled, stop waiting for requests");
                    return Ok(());
                }
                next = timeout(config.read_timeout(), framed_read.next()) => next,
            };

            let (header, body) = match next {
                Ok(Some(Ok(parts))) => parts,

                Ok(None) => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }

                Ok(Some(Err(e))) if e.is_transport() => {
                    warn!(cause = %e, "connection broken while reading request");
                    return Err(e.into());
                }

                Ok(Some(Err(e))) => {
                    error!(cause = %e, "can't receive next request");
                    reject(message_writer, &cancellation, e.status_code()).await;
                    return Err(e.into());
                }

                Err(_) => {
                    let e = ParseError::Timeout(config.read_timeout());
                    warn!(cause = %e, "can't receive next request");
                    reject(message_writer, &cancellation, e.status_code()).await;
                    return Err(e.into());
                }
            };

            let request_token = cancellation.child_token();
            let _request_guard = request_token.clone().drop_guard();

            let mut request = Request::new(header, body);
            request.set_cancellation_token(request_token);

            match serve_request(&router, request, message_writer, &cancellation).await? {
                Some(writer) => message_writer = writer,
                None => return Ok(()),
            }
        }
    }

    /// Runs [`process`](Self::process) and logs how the connection ended.
    ///
    /// A panicking handler only takes its own connection down: the panic is
    /// caught here and both stream halves are dropped.
    pub async fn serve(self, router: Arc<Router>) {
        match AssertUnwindSafe(self.process(router)).catch_unwind().await {
            Ok(Ok(())) => info!("finished process, connection shutdown"),
            Ok(Err(e)) => warn!(cause = %e, "connection shutdown with error"),
            Err(panic) => error!(cause = panic_message(&*panic), "handler panicked, connection shutdown"),
        }
    }
}

/// Routes and handles one request.
///
/// Returns the writer when the connection may carry another request.
async fn serve_request(
    router: &Router,
    mut request: Request,
    writer: MessageWriter,
    connection_token: &CancellationToken,
) -> Result<Option<MessageWriter>, HttpError> {
    let request_token = request.cancellation_token().clone();
    let chunked_connection = ConnectionType::negotiate(Some(&request), false);

    let (handler, params) = match router.at(request.method(), request.path()) {
        Ok(route) => route.into_parts(),
        Err(e) => {
            info!(cause = %e, "no route for request");
            let mut response = Response::new(writer, connection_token.clone(), Some(request_token), chunked_connection);
            write_status(&mut response, StatusCode::NOT_FOUND, Some(&request), false).await?;
            return Ok(reusable(response));
        }
    };
    request.set_params(params);

    let mut response = Response::new(writer, connection_token.clone(), Some(request_token), chunked_connection);
    if let Err(e) = handler.call(&request, &mut response).await {
        error!(method = %request.method(), path = request.path(), cause = %e, "handler failed");
        if !response.is_committed() && response.error().is_none() {
            let mut response = Response::new(response.into_writer(), connection_token.clone(), None, ConnectionType::Close);
            if let Err(send_error) = write_status(&mut response, StatusCode::INTERNAL_SERVER_ERROR, Some(&request), true).await {
                warn!(cause = %send_error, "failed to send error response");
            }
        }
        return Err(HttpError::handler(e));
    }

    if let Some(e) = response.error() {
        warn!(method = %request.method(), path = request.path(), cause = %e, "response failed, close connection");
        return Err(e.clone().into());
    }

    if !response.is_finished() {
        warn!(method = %request.method(), path = request.path(), "handler left the response unfinished, close connection");
        return Ok(None);
    }

    Ok(reusable(response))
}

fn reusable(response: Response) -> Option<MessageWriter> {
    match response.connection() {
        Some(ConnectionType::KeepAlive) => Some(response.into_writer()),
        _ => None,
    }
}

/// Writes `status` with its reason phrase as a plain body.
async fn write_status(
    response: &mut Response,
    status: StatusCode,
    request: Option<&Request>,
    server_wants_close: bool,
) -> Result<(), SendError> {
    response.write_header(status)?;
    response.write(reason_phrase(status).unwrap_or_default().as_bytes())?;
    response.flush(request, server_wants_close).await
}

/// Answers a request that could not be read and announces the close.
async fn reject(writer: MessageWriter, connection_token: &CancellationToken, status: StatusCode) {
    let mut response = Response::new(writer, connection_token.clone(), None, ConnectionType::Close);
    if let Err(e) = write_status(&mut response, status, None, true).await {
        warn!(cause = %e, "failed to send error response");
    }
}
