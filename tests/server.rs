//! End-to-end server scenarios over real sockets.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use skiff_http::handler::{handler_fn, Handler};
use skiff_http::protocol::{Method, Request, Response, StatusCode};
use skiff_http::server::{Server, ServerConfig};

const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n";

async fn spawn_server<H: Handler>(config: ServerConfig, handler: H) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::builder().config(config).handler(handler).build().unwrap();
    tokio::spawn(server.serve(listener));
    addr
}

fn hi(request: &Request<'_>) -> Response {
    if request.method == Method::Get && request.url.path == "/x" {
        Response::with_body(StatusCode::OK, "hi")
    } else {
        Response::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn echo(request: &Request<'_>) -> Response {
    Response::with_body(StatusCode::OK, request.body.to_vec())
}

fn plain_response(version: &str, code: u16, body: &str) -> Vec<u8> {
    format!("{version} {code}\r\nConnection: close\r\nContent-Type: text/plain\r\n\r\n{body}")
        .into_bytes()
}

#[tokio::test]
async fn get_with_keep_alive() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(hi)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let expected = plain_response("HTTP/1.1", 200, "hi");

    stream.write_all(b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);

    // The keep-alive decision follows the request, not the response's
    // Connection header, so a second exchange works on the same socket.
    stream.write_all(b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);
}

#[tokio::test]
async fn http_1_0_closes_after_the_response() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(hi)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /x HTTP/1.0\r\nHost: h\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, plain_response("HTTP/1.0", 200, "hi"));
}

#[tokio::test]
async fn connection_close_is_honored() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(hi)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /x HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, plain_response("HTTP/1.1", 200, "hi"));
}

#[tokio::test]
async fn post_with_exact_content_length() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(echo)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: 5\r\n\r\nhello")
        .await
        .unwrap();

    let expected = plain_response("HTTP/1.1", 200, "hello");
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);
}

#[tokio::test]
async fn body_beyond_content_length_is_ignored() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(echo)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: 5\r\n\r\nhello-and-junk")
        .await
        .unwrap();

    let expected = plain_response("HTTP/1.1", 200, "hello");
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);
}

#[tokio::test]
async fn delayed_body_is_read_to_completion() {
    let mut config = ServerConfig::default();
    config.full_read_timeout_ms = 2_000;
    let addr = spawn_server(config, handler_fn(echo)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: 12\r\n\r\nhello")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(b" world!").await.unwrap();

    let expected = plain_response("HTTP/1.1", 200, "hello world!");
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);
}

#[tokio::test]
async fn malformed_request_gets_the_fixed_400() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(hi)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"NOPE /x HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, BAD_REQUEST);
}

#[tokio::test]
async fn invalid_content_length_gets_the_fixed_400() {
    let addr = spawn_server(ServerConfig::default(), handler_fn(echo)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: abc\r\n\r\n")
        .await
        .unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, BAD_REQUEST);
}

#[tokio::test]
async fn oversize_body_gets_the_fixed_400() {
    let mut config = ServerConfig::default();
    config.max_request_body_size = 8;
    let addr = spawn_server(config, handler_fn(echo)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: 9\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, BAD_REQUEST);
}

#[tokio::test]
async fn read_timeout_shuts_the_connection_down() {
    let mut config = ServerConfig::default();
    config.full_read_timeout_ms = 100;
    let addr = spawn_server(config, handler_fn(hi)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Send nothing; the server shuts down and closes after the deadline
    // without writing a byte.
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert!(buf.is_empty());
}

#[tokio::test]
async fn handler_sees_parsed_url_parts() {
    fn describe(request: &Request<'_>) -> Response {
        Response::with_body(
            StatusCode::OK,
            format!("{} {}", request.url.path, request.url.query.unwrap_or("-")),
        )
    }

    let addr = spawn_server(ServerConfig::default(), handler_fn(describe)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /a/b/../c?k=v HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
    let expected = plain_response("HTTP/1.1", 200, "/a/c k=v");
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(buf, expected);
}
