//! Client sessions against an in-process server.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use skiff_http::client::{request, ClientError, ClientSession};
use skiff_http::connection::Connector;
use skiff_http::handler::{handler_fn, Handler};
use skiff_http::protocol::{HeaderMap, Method, Request, Response, StatusCode};
use skiff_http::server::{Server, ServerConfig};

async fn spawn_server<H: Handler>(handler: H) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::builder().config(ServerConfig::default()).handler(handler).build().unwrap();
    tokio::spawn(server.serve(listener));
    addr
}

fn with_content_length(mut response: Response) -> Response {
    let length = response.body.len().to_string();
    response.headers.add("Content-Length".to_owned(), length);
    response
}

fn pong(_request: &Request<'_>) -> Response {
    with_content_length(Response::with_body(StatusCode::OK, "pong"))
}

fn big(_request: &Request<'_>) -> Response {
    with_content_length(Response::with_body(StatusCode::OK, "a".repeat(4000)))
}

fn echo(request: &Request<'_>) -> Response {
    with_content_length(Response::with_body(StatusCode::OK, request.body.to_vec()))
}

#[tokio::test]
async fn get_against_local_server() {
    let addr = spawn_server(handler_fn(pong)).await;

    let url = format!("http://{addr}/x");
    let response = request(Method::Get, &url, &HeaderMap::new(), b"").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"pong");
    assert_eq!(response.headers.get("content-type"), Some("text/plain"));
}

#[tokio::test]
async fn response_body_longer_than_the_first_read() {
    let addr = spawn_server(handler_fn(big)).await;

    let url = format!("http://{addr}/big");
    let response = request(Method::Get, &url, &HeaderMap::new(), b"").await.unwrap();
    assert_eq!(response.body.len(), 4000);
    assert!(response.body.iter().all(|byte| *byte == b'a'));
}

#[tokio::test]
async fn post_round_trips_the_body() {
    let addr = spawn_server(handler_fn(echo)).await;

    let mut headers = HeaderMap::new();
    headers.add("Content-Length".to_owned(), "11".to_owned());
    let url = format!("http://{addr}/p");
    let response = request(Method::Post, &url, &headers, b"hello there").await.unwrap();
    assert_eq!(&response.body[..], b"hello there");
}

#[tokio::test]
async fn session_reuses_the_connection() {
    let addr = spawn_server(handler_fn(pong)).await;

    let mut session =
        ClientSession::new(Connector::Plain, addr.ip().to_string(), Some(addr.port()));
    let first = session.request(Method::Get, "/x", &HeaderMap::new(), b"").await.unwrap();
    assert_eq!(&first.body[..], b"pong");

    // The transport stays on the session after a completed exchange; the
    // server kept the connection alive, so this runs on the same socket.
    let second = session.request(Method::Get, "/x", &HeaderMap::new(), b"").await.unwrap();
    assert_eq!(&second.body[..], b"pong");
}

#[tokio::test]
async fn unsupported_scheme_is_invalid() {
    let result = request(Method::Get, "ftp://example.org/x", &HeaderMap::new(), b"").await;
    assert!(matches!(result, Err(ClientError::InvalidUrl)));

    let result = request(Method::Get, "not a url", &HeaderMap::new(), b"").await;
    assert!(matches!(result, Err(ClientError::InvalidUrl)));
}

#[tokio::test]
async fn declared_length_truncates_the_body() {
    fn overlong(_request: &Request<'_>) -> Response {
        let mut response = Response::with_body(StatusCode::OK, "pong-and-trailing-junk");
        response.headers.add("Content-Length".to_owned(), "4".to_owned());
        response
    }

    let addr = spawn_server(handler_fn(overlong)).await;
    let url = format!("http://{addr}/x");
    let response = request(Method::Get, &url, &HeaderMap::new(), b"").await.unwrap();
    assert_eq!(&response.body[..], b"pong");
}
