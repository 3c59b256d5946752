//! HTTP server: configuration, metrics, the per-connection session and the
//! listening server itself.

mod config;
pub use config::{ConfigError, ServerConfig};

pub mod metrics;
pub use metrics::Metrics;

mod server;
pub use server::{Server, ServerBuildError, ServerBuilder};

mod session;
pub(crate) use session::Session;
