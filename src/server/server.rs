use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{error, info, warn};

use crate::connection::ConnectionFactory;
use crate::handler::Handler;
use crate::server::metrics::Metrics;
use crate::server::{ServerConfig, Session};

pub struct ServerBuilder<H> {
    config: ServerConfig,
    handler: Option<Arc<H>>,
    factory: ConnectionFactory,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("handler must be set")]
    MissingHandler,
}

impl<H: Handler> ServerBuilder<H> {
    fn new() -> ServerBuilder<H> {
        ServerBuilder {
            config: ServerConfig::default(),
            handler: None,
            factory: ConnectionFactory::Plain,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Serves TLS with the given acceptor instead of plain TCP.
    #[cfg(feature = "tls")]
    pub fn tls(mut self, acceptor: tokio_rustls::TlsAcceptor) -> Self {
        self.factory = ConnectionFactory::Tls(Some(acceptor));
        self
    }

    pub fn build(self) -> Result<Server<H>, ServerBuildError> {
        let handler = self.handler.ok_or(ServerBuildError::MissingHandler)?;
        Ok(Server { config: self.config, handler, factory: self.factory })
    }
}

/// The listening server. Owns the listen socket and spawns a [`Session`]
/// per accepted connection; the handler is shared by all of them.
pub struct Server<H> {
    config: ServerConfig,
    handler: Arc<H>,
    factory: ConnectionFactory,
}

impl<H: Handler> Server<H> {
    pub fn builder() -> ServerBuilder<H> {
        ServerBuilder::new()
    }

    /// Binds the configured address and serves forever.
    pub async fn run(self) -> io::Result<()> {
        let listener = match self.bind() {
            Ok(listener) => listener,
            Err(e) => {
                error!(cause = %e, "could not create listen socket");
                return Err(e);
            }
        };
        self.serve(listener).await
    }

    fn bind(&self) -> io::Result<TcpListener> {
        let addr = SocketAddr::new(self.config.listen_address, self.config.listen_port);
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(self.config.listen_backlog)?;
        info!(%addr, "listening");
        Ok(listener)
    }

    /// The accept chain over an already-bound listener. Accept errors are
    /// counted and skipped; a refused connection factory (TLS context not
    /// loaded) drops the accepted stream without a session.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        let config = Arc::new(self.config);
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    Metrics::global().accept_errors.inc(&e.to_string());
                    warn!(cause = %e, "error in accept");
                    continue;
                }
            };
            Metrics::global().conn_accepted.inc();

            let handler = Arc::clone(&self.handler);
            let config = Arc::clone(&config);
            let factory = self.factory.clone();
            tokio::spawn(async move {
                // The TLS handshake happens in the session task so a slow
                // peer cannot stall the accept chain.
                let connection = match factory.accept(stream).await {
                    Ok(connection) => connection,
                    Err(e) => {
                        // Dropping the stream closes the fd.
                        warn!(cause = %e, "could not establish connection");
                        return;
                    }
                };
                Session::new(connection, handler, remote_addr.to_string(), config).process().await;
            });
        }
    }
}
