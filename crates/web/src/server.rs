use std::future::{Future, pending};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::pin::pin;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use wire_http::config::Config;
use wire_http::connection::HttpConnection;
use wire_http::router::Router;

#[derive(Debug)]
pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    config: Config,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, address: None, config: Config::default() }
    }

    /// Sets the address to listen on. Resolution errors surface from [`build`](Self::build).
    #[must_use]
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    ///
    /// Fails when the router or the address is missing, or when the address
    /// did not resolve to at least one socket address.
    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::invalid_address)?;
        if address.is_empty() {
            return Err(ServerBuildError::invalid_address(io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to nothing",
            )));
        }

        Ok(Server {
            router: Arc::new(router),
            address,
            config: Arc::new(self.config),
            cancellation: CancellationToken::new(),
        })
    }
}

/// Accepts TCP connections and serves each one on its own task.
#[derive(Debug)]
pub struct Server {
    router: Arc<Router>,
    address: Vec<SocketAddr>,
    config: Arc<Config>,
    cancellation: CancellationToken,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
}

impl ServerBuildError {
    fn invalid_address(source: io::Error) -> Self {
        Self::InvalidAddress { source }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind server error: {source}")]
    Bind { source: io::Error },
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The server-wide token; every connection token is a child of it.
    ///
    /// Cancelling it closes idle connections and fails pending writes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Binds the configured address and serves until the process ends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the listener cannot be bound.
    pub async fn start(self) -> Result<(), ServerError> {
        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(ServerError::Bind { source: e });
            }
        };

        self.serve(tcp_listener, pending()).await;
        Ok(())
    }

    /// Serves connections from `tcp_listener` until `shutdown` resolves.
    ///
    /// On shutdown the server stops accepting and cancels its token, which
    /// closes every connection waiting for its next request.
    pub async fn serve<F>(self, tcp_listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = pin!(shutdown);
        loop {
            let (tcp_stream, remote_addr) = select! {
                () = &mut shutdown => {
                    info!("shutdown requested, stop accepting");
                    break;
                }
                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::with_cancellation(
                reader,
                writer,
                Arc::clone(&self.config),
                self.cancellation.child_token(),
            );
            let router = Arc::clone(&self.router);
            tokio::spawn(connection.serve(router).instrument(info_span!("connection", %remote_addr)));
        }

        self.cancellation.cancel();
    }
}
