use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::runtime::Runtime;
use tokio_util::codec::{Decoder, Encoder};
use wire_http::codec::{RequestDecoder, ResponseEncoder};
use wire_http::config::Config;
use wire_http::connection::HttpConnection;
use wire_http::handler::HandlerResult;
use wire_http::protocol::{Message, PayloadItem, PayloadSize, Request, ResponseHead};
use wire_http::response::Response;
use wire_http::router::{Router, get};

const SIMPLE_REQUEST: &[u8] = b"GET /api/param/42 HTTP/1.1\r\nHost: localhost\r\nUser-Agent: bench\r\n\r\n";

// Reads a fixed input, then reports EOF. Writes are discarded.
struct MockIO {
    read_data: Bytes,
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let amt = std::cmp::min(self.read_data.len(), buf.remaining());
        let chunk = self.read_data.split_to(amt);
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

struct Sink;

impl AsyncWrite for Sink {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

async fn param_handler(request: &Request, response: &mut Response) -> HandlerResult {
    let body = format!("Id {}", request.param("id").unwrap_or_default());
    response.write(body.as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

fn bench_request_decoder(c: &mut Criterion) {
    let config = Config::default();

    c.bench_function("decode_simple_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new(&config);
            let mut bytes = BytesMut::from(SIMPLE_REQUEST);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let body = Bytes::from_static(b"Hello World!");

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            let head = ResponseHead::default();
            let header = Message::<_, Bytes>::Header((head, PayloadSize::from_length(body.len() as u64)));
            encoder.encode(header, &mut bytes).unwrap();
            let payload = Message::<(ResponseHead, PayloadSize), _>::Payload(PayloadItem::Chunk(body.clone()));
            encoder.encode(payload, &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let router = Arc::new(Router::builder().route("/api/param/:id", get(param_handler)).build().unwrap());
    let config = Arc::new(Config::default());

    c.bench_function("process_simple_request", |b| {
        b.to_async(&runtime).iter(|| {
            let reader = MockIO { read_data: Bytes::from_static(SIMPLE_REQUEST) };
            let connection = HttpConnection::new(reader, Sink, Arc::clone(&config));
            let router = Arc::clone(&router);
            async move { black_box(connection.process(router).await.unwrap()) }
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder, bench_http_connection);
criterion_main!(benches);
