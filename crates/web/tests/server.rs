use std::net::SocketAddr;

use indoc::indoc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wire_web::handler::HandlerResult;
use wire_web::router::{Router, get, post};
use wire_web::{Request, Response, Server, StatusCode};

async fn profile(request: &Request, response: &mut Response) -> HandlerResult {
    let id = request.param("id").unwrap_or_default();
    let name = request.param("name").unwrap_or_default();
    response.write(format!("Id {id} Name {name}").as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn wildcard(request: &Request, response: &mut Response) -> HandlerResult {
    response.write(format!("wild path {}", request.param("anything").unwrap_or_default()).as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn wake_up(request: &Request, response: &mut Response) -> HandlerResult {
    response.write_header(StatusCode::CREATED)?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn stream(_request: &Request, response: &mut Response) -> HandlerResult {
    response.set_header("Content-Type", "text/plain")?;
    response.set_header("Transfer-Encoding", "chunked")?;
    for chunk in ["Testing\n", "Transfer\n", "Encoding\n"] {
        response.write_chunk(chunk.as_bytes()).await?;
    }
    response.end_chunked().await?;
    Ok(())
}

async fn explode(_request: &Request, _response: &mut Response) -> HandlerResult {
    panic!("handler blew up");
}

struct TestServer {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let router = Router::builder()
            .route("/api/param/:id/profile/:name", get(profile))
            .route("/api/wildcard/*anything", get(wildcard))
            .route("/api/wake-up", post(wake_up))
            .route("/stream", get(stream))
            .route("/api/panic", get(explode))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = Server::builder().address(address).router(router).build().unwrap();

        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = signal.await;
        }));
        Self { address, shutdown, handle }
    }

    async fn send(&self, request: &str) -> String {
        let mut stream = TcpStream::connect(self.address).await.unwrap();
        stream.write_all(request.replace('\n', "\r\n").as_bytes()).await.unwrap();

        let mut received = String::new();
        stream.read_to_string(&mut received).await.unwrap();
        received.replace("\r\n", "\n")
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap();
    }
}

#[tokio::test]
async fn params_and_keep_alive() {
    let server = TestServer::start().await;

    let request = indoc! {"
    GET /api/param/42/profile/ada HTTP/1.1
    Host: localhost

    GET /api/wildcard/a/b/c HTTP/1.1
    Host: localhost
    Connection: close

    "};
    let expected = indoc! {"
    HTTP/1.1 200 OK
    connection: keep-alive
    content-length: 18

    Id 42 Name adaHTTP/1.1 200 OK
    connection: close
    content-length: 15

    wild path a/b/c"};
    assert_eq!(server.send(request).await, expected);

    server.stop().await;
}

#[tokio::test]
async fn post_with_body() {
    let server = TestServer::start().await;

    let request = indoc! {"
    POST /api/wake-up HTTP/1.1
    Host: localhost
    Content-Length: 11
    Connection: close

    hello world"};
    let expected = "HTTP/1.1 201 Created\nconnection: close\ncontent-length: 0\n\n";
    assert_eq!(server.send(request).await, expected);

    server.stop().await;
}

#[tokio::test]
async fn chunked_stream() {
    let server = TestServer::start().await;

    let request = "GET /stream HTTP/1.1\nHost: localhost\nConnection: close\n\n";
    let expected = indoc! {"
    HTTP/1.1 200 OK
    content-type: text/plain
    transfer-encoding: chunked
    connection: close

    8
    Testing

    9
    Transfer

    9
    Encoding

    0

    "};
    assert_eq!(server.send(request).await, expected);

    server.stop().await;
}

#[tokio::test]
async fn errors_are_answered() {
    let server = TestServer::start().await;

    let not_found = server.send("GET /api/nothing HTTP/1.1\nHost: localhost\nConnection: close\n\n").await;
    assert_eq!(not_found, "HTTP/1.1 404 Not Found\nconnection: close\ncontent-length: 9\n\nNot Found");

    let bad_request = server.send("GET /api/nothing HTTP/1.1\n\n").await;
    assert_eq!(bad_request, "HTTP/1.1 400 Bad Request\nconnection: close\ncontent-length: 11\n\nBad Request");

    server.stop().await;
}

#[tokio::test]
async fn panic_only_drops_its_connection() {
    let server = TestServer::start().await;

    let mut stream = TcpStream::connect(server.address).await.unwrap();
    stream.write_all(b"GET /api/panic HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
    let mut received = Vec::new();
    // the socket is dropped without an answer, a reset counts as closed too
    let _ = stream.read_to_end(&mut received).await;
    assert!(received.is_empty());

    let request = "GET /api/param/1/profile/bob HTTP/1.1\nHost: localhost\nConnection: close\n\n";
    let expected = "HTTP/1.1 200 OK\nconnection: close\ncontent-length: 13\n\nId 1 Name bob";
    assert_eq!(server.send(request).await, expected);

    server.stop().await;
}
