use anyhow::Context;
use tracing::info;

use skiff_http::protocol::{Method, Request, Response, StatusCode};
use skiff_http::router::{RouteParams, Router};
use skiff_http::server::{Server, ServerConfig};

fn greet(_request: &Request<'_>, _params: &RouteParams<'_, '_>) -> Response {
    Response::with_body(StatusCode::OK, "Hello!")
}

fn foo(_request: &Request<'_>, _params: &RouteParams<'_, '_>) -> Response {
    Response::with_body(StatusCode::OK, "This is foo")
}

fn show_headers(request: &Request<'_>, _params: &RouteParams<'_, '_>) -> Response {
    let mut body = String::with_capacity(1024);
    for (name, value) in request.headers.iter() {
        body.push_str(&format!("'{name}' = '{value}'\n"));
    }
    Response::with_body(StatusCode::OK, body)
}

fn show_user(_request: &Request<'_>, params: &RouteParams<'_, '_>) -> Response {
    Response::with_body(StatusCode::OK, format!("User #'{}'", params.get("uid").unwrap_or("")))
}

fn show_user_file(_request: &Request<'_>, params: &RouteParams<'_, '_>) -> Response {
    Response::with_body(
        StatusCode::OK,
        format!(
            "File '{}' for user '{}'",
            params.get("path").unwrap_or(""),
            params.get("uid").unwrap_or("")
        ),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).with_max_level(tracing::Level::INFO).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => ServerConfig::default(),
    };
    let config = config.apply_env();
    info!(
        address = %config.listen_address,
        port = config.listen_port,
        "starting http server"
    );

    let router = Router::builder()
        .route_method("/", Method::Get, greet)
        .route_method("/foo", Method::Get, foo)
        .route("/headers", show_headers)
        .route("/users/{uid}", show_user)
        .route("/users/{uid}/files/{*path}", show_user_file)
        .build()?;

    let server = Server::builder().config(config).handler(router).build()?;

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
