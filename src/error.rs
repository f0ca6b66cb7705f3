//! Error types for Minisocks
//!
//! This module defines all custom error types used throughout the proxy.

use std::io;
use thiserror::Error;

/// Error type for loading and parsing the server configuration
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// SOCKS5 wire and protocol errors
#[derive(Error, Debug)]
pub enum SocksError {
    /// The received buffer is shorter than the message layout requires
    #[error("Truncated message: needed {needed} more byte(s), {remaining} remaining")]
    Truncated {
        /// Bytes the current field still needs
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Command byte is not CONNECT, BIND, or UDP ASSOCIATE
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(u8),

    /// Address type tag is not IPv4, domain, or IPv6
    #[error("Unsupported address type: {0}")]
    UnsupportedAddressType(u8),

    /// Reserved field of a UDP datagram header was non-zero
    #[error("Invalid reserved field: {0:#06x}")]
    InvalidReserved(u16),

    /// Domain name bytes were not valid UTF-8
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// The UDP ASSOCIATE control channel carried data after the request
    #[error("Unexpected data on UDP associate control channel: {0} byte(s)")]
    UnexpectedControlData(usize),
}
