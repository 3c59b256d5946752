//! TLS context loading.
//!
//! The server side takes a PEM certificate chain and private key (what
//! certbot produces) and turns them into a [`TlsAcceptor`] for
//! [`ConnectionFactory::Tls`](super::ConnectionFactory). The client side
//! builds a [`TlsConnector`] over the bundled webpki roots.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{self, RootCertStore};
use tokio_rustls::{TlsAcceptor, TlsConnector};

/// Where to find the server certificate chain and key, both PEM without a
/// password.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_chain: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("no private key in {}", path.display())]
    NoPrivateKey { path: PathBuf },

    #[error("tls error: {source}")]
    Tls {
        #[from]
        source: rustls::Error,
    },
}

/// Loads the server TLS context from `config`.
pub fn load_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, TlsError> {
    let certs = read_cert_chain(&config.cert_chain)?;
    let key = read_private_key(&config.key)?;

    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

/// A client connector trusting the webpki root set.
pub fn client_connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let client_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(client_config))
}

fn read_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read { path: path.to_owned(), source })?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read { path: path.to_owned(), source })
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read { path: path.to_owned(), source })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|source| TlsError::Read { path: path.to_owned(), source })?
        .ok_or_else(|| TlsError::NoPrivateKey { path: path.to_owned() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_reported() {
        let config = TlsConfig {
            cert_chain: PathBuf::from("/nonexistent/chain.pem"),
            key: PathBuf::from("/nonexistent/key.pem"),
        };
        assert!(matches!(load_acceptor(&config), Err(TlsError::Read { .. })));
    }
}
