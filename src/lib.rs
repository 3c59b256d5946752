//! Asynchronous HTTP/1.1 client and server library.
//!
//! The crate is split along the wire:
//!
//! - [`protocol`]: the data model (methods, status codes, headers, URLs,
//!   requests, responses)
//! - [`codec`]: parsing and serializing HTTP/1.1 messages on byte slices
//! - [`connection`]: the byte-stream transport, plain TCP or TLS
//! - [`client`]: a single-flight client session
//! - [`server`]: the listener and per-connection server session
//! - [`router`]: path-pattern routing on top of [`handler::Handler`]

pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod router;
pub mod server;

pub(crate) use help::ensure;

mod help {

    macro_rules! ensure {
        ($predicate:expr, $error:expr) => {
            if !$predicate {
                return Err($error);
            }
        };
    }
    pub(crate) use ensure;
}
