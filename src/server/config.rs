use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Server configuration.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change. `SKIFF_LISTEN_ADDRESS` and `SKIFF_LISTEN_PORT` override the
/// listen address from the environment via [`ServerConfig::apply_env`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    pub listen_backlog: u32,
    /// Upper bound for request line plus all headers; the server reads this
    /// much in one go.
    pub max_request_header_size: usize,
    pub max_request_body_size: usize,
    pub max_url_length: usize,
    /// Absolute deadline for reading one full request, in milliseconds.
    pub full_read_timeout_ms: u64,
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 6969,
            listen_backlog: 1024,
            // 1024 is enough for most requests, usually below the MTU
            max_request_header_size: 1024,
            max_request_body_size: 1024,
            max_url_length: 512,
            full_read_timeout_ms: 1000,
            access_log: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {source}")]
    Read {
        #[from]
        source: io::Error,
    },

    #[error("could not parse config file: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
}

impl ServerConfig {
    /// Loads a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<ServerConfig, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&source)?)
    }

    /// Applies environment overrides for the listen address and port.
    /// Unparseable values are logged and ignored.
    pub fn apply_env(mut self) -> ServerConfig {
        if let Ok(value) = std::env::var("SKIFF_LISTEN_ADDRESS") {
            match value.parse() {
                Ok(address) => self.listen_address = address,
                Err(_) => warn!(value = %value, "ignoring unparseable SKIFF_LISTEN_ADDRESS"),
            }
        }
        if let Ok(value) = std::env::var("SKIFF_LISTEN_PORT") {
            match value.parse() {
                Ok(port) => self.listen_port = port,
                Err(_) => warn!(value = %value, "ignoring unparseable SKIFF_LISTEN_PORT"),
            }
        }
        self
    }
}
