//! The byte-stream transport under a session.
//!
//! [`Connection`] gives client and server sessions one uniform surface over
//! plain TCP and TLS: `recv` with an optional absolute deadline, `send`
//! with partial writes surfaced to the caller, and an orderly `shutdown`
//! (close-notify on TLS). Closing is dropping.
//!
//! Connections are produced by [`ConnectionFactory`] (server side, from an
//! accepted stream) and [`Connector`] (client side, from a connected
//! stream). The TLS factory refuses with [`TransportError::NotReady`] while
//! no TLS context is loaded.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

#[cfg(feature = "tls")]
pub mod tls;

#[cfg(feature = "tls")]
use tokio_rustls::rustls::pki_types::ServerName;

/// Errors surfaced by transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An absolute deadline expired before the operation completed.
    #[error("operation timed out")]
    TimedOut,

    /// The connection factory cannot produce connections yet.
    #[error("transport not ready")]
    NotReady,

    /// The host is not usable as a TLS server name.
    #[cfg(feature = "tls")]
    #[error("invalid tls hostname")]
    InvalidHostname,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A plain-TCP or TLS byte stream.
pub enum Connection {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    ServerTls(Box<tokio_rustls::server::TlsStream<TcpStream>>),
    #[cfg(feature = "tls")]
    ClientTls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Connection {
    /// Reads up to `buf.len()` bytes. `Ok(0)` means the peer performed an
    /// orderly close. When a deadline is given it is absolute; expiry
    /// yields [`TransportError::TimedOut`], distinguishable from other
    /// failures.
    pub async fn recv(
        &mut self,
        buf: &mut [u8],
        deadline: Option<Instant>,
    ) -> Result<usize, TransportError> {
        match deadline {
            Some(deadline) => match timeout_at(deadline, self.read(buf)).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(TransportError::TimedOut),
            },
            None => Ok(self.read(buf).await?),
        }
    }

    /// Writes up to `buf.len()` bytes and returns how many were accepted.
    /// Partial sends are expected; the caller advances its cursor and
    /// re-arms.
    pub async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf).await
    }

    /// Orderly shutdown of the send direction. On TLS this emits
    /// close-notify. After a transport error the caller should close
    /// (drop) without shutting down.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        AsyncWriteExt::shutdown(self).await
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(feature = "tls")]
            Connection::ServerTls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
            #[cfg(feature = "tls")]
            Connection::ClientTls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(feature = "tls")]
            Connection::ServerTls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
            #[cfg(feature = "tls")]
            Connection::ClientTls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(feature = "tls")]
            Connection::ServerTls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
            #[cfg(feature = "tls")]
            Connection::ClientTls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(feature = "tls")]
            Connection::ServerTls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
            #[cfg(feature = "tls")]
            Connection::ClientTls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Produces server-side connections from accepted streams.
#[derive(Clone)]
pub enum ConnectionFactory {
    Plain,
    /// Refuses with [`TransportError::NotReady`] while `None`.
    #[cfg(feature = "tls")]
    Tls(Option<tokio_rustls::TlsAcceptor>),
}

impl ConnectionFactory {
    pub async fn accept(&self, stream: TcpStream) -> Result<Connection, TransportError> {
        match self {
            ConnectionFactory::Plain => Ok(Connection::Plain(stream)),
            #[cfg(feature = "tls")]
            ConnectionFactory::Tls(None) => Err(TransportError::NotReady),
            #[cfg(feature = "tls")]
            ConnectionFactory::Tls(Some(acceptor)) => {
                let stream = acceptor.accept(stream).await?;
                Ok(Connection::ServerTls(Box::new(stream)))
            }
        }
    }
}

/// Produces client-side connections from connected streams.
#[derive(Clone)]
pub enum Connector {
    Plain,
    #[cfg(feature = "tls")]
    Tls(tokio_rustls::TlsConnector),
}

impl Connector {
    /// The scheme default port for sessions built on this connector: 80 for
    /// plain, 443 for TLS.
    pub fn default_port(&self) -> u16 {
        match self {
            Connector::Plain => 80,
            #[cfg(feature = "tls")]
            Connector::Tls(_) => 443,
        }
    }

    /// Wraps a connected stream. For TLS the hostname is bound before the
    /// first I/O, for SNI and certificate validation.
    pub async fn connect(
        &self,
        stream: TcpStream,
        host: &str,
    ) -> Result<Connection, TransportError> {
        match self {
            Connector::Plain => Ok(Connection::Plain(stream)),
            #[cfg(feature = "tls")]
            Connector::Tls(connector) => {
                let name = ServerName::try_from(host.to_owned())
                    .map_err(|_| TransportError::InvalidHostname)?;
                let stream = connector.connect(name, stream).await?;
                Ok(Connection::ClientTls(Box::new(stream)))
            }
        }
    }
}
