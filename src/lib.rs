//! # Minisocks - Plain SOCKS5 Proxy
//!
//! Minisocks is a small, unauthenticated SOCKS5 proxy. It accepts
//! client connections, negotiates the handshake (always "no
//! authentication"), and relays traffic to the requested destination:
//! TCP CONNECT runs a bidirectional byte relay until either side
//! closes, and UDP ASSOCIATE relays individual datagrams through a
//! shared UDP socket with one ephemeral exchange per datagram.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use minisocks::config::ServerConfig;
//! use minisocks::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = Server::bind(&config).await?;
//!     server.run().await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client --TCP--> Server -> handshake -> request -> TcpRelay -> Target
//! Client --UDP--> Server -> per-datagram exchange  ----------> Target
//! ```
//!
//! BIND is not supported, and CONNECT replies carry a fixed
//! placeholder bound endpoint rather than the true local socket.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, ServerConfig};
pub use error::{ProxyError, SocksError};
pub use server::Server;

/// Version of the Minisocks library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "minisocks");
    }
}
