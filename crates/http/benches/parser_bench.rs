use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use http::StatusCode;
use relay_http::codec::{RequestParser, ResponseEncoder};
use relay_http::connection::{Connection, HttpReaderFactory};
use relay_http::handler::dispatch_fn;
use relay_http::protocol::{Request, Response};
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::Encoder;

const SIMPLE_REQUEST: &[u8] = b"GET /api/example HTTP/1.1\r\nHost: localhost\r\n\r\n";

const JSON_REQUEST: &[u8] = b"POST /api/part/42/bob HTTP/1.1\r\n\
Host: localhost\r\n\
Content-Type: application/json\r\n\
Content-Length: 31\r\n\
\r\n\
{\"username\":\"u\",\"password\":\"p\"}";

// Mock IO for testing
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
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

async fn hello(_request: Request) -> Response {
    Response::new().status(StatusCode::OK).body("Hello World!")
}

fn bench_request_parser(c: &mut Criterion) {
    c.bench_function("parse_simple_request", |b| {
        b.iter(|| {
            let mut parser = RequestParser::new();
            parser.feed(black_box(SIMPLE_REQUEST)).unwrap();
            black_box(parser.take_request().unwrap());
        });
    });

    c.bench_function("parse_json_request", |b| {
        b.iter(|| {
            let mut parser = RequestParser::new();
            parser.feed(black_box(JSON_REQUEST)).unwrap();
            black_box(parser.take_request().unwrap());
        });
    });

    c.bench_function("parse_json_request_in_8_byte_chunks", |b| {
        b.iter(|| {
            let mut parser = RequestParser::new();
            for chunk in JSON_REQUEST.chunks(8) {
                parser.feed(black_box(chunk)).unwrap();
            }
            black_box(parser.take_request().unwrap());
        });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let response = Response::new().status(StatusCode::OK).body("Hello World!");

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::new();
            ResponseEncoder::new().encode(response.clone(), &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let factory = HttpReaderFactory::new(dispatch_fn(hello));

    c.bench_function("process_simple_request", |b| {
        b.iter(|| {
            let reader = MockIO { read_data: SIMPLE_REQUEST.to_vec(), read_pos: 0 };
            let connection = Connection::new(reader, Sink);
            block_on(connection.process(&factory));
        });
    });
}

criterion_group!(benches, bench_request_parser, bench_response_encoder, bench_http_connection);
criterion_main!(benches);
