//! SOCKS5 protocol constants
//!
//! Defines all constants used in the SOCKS5 protocol implementation.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (not implemented)
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reply codes
/// Succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Placeholder bound endpoint in CONNECT replies.
// The reply always reports success with this fixed address instead of
// the real local endpoint; clients that need the true bound address
// are incompatible with this baseline.
/// Placeholder BND.ADDR octets (0.0.0.0)
pub const PLACEHOLDER_BIND_ADDR: [u8; 4] = [0, 0, 0, 0];
/// Placeholder BND.PORT
pub const PLACEHOLDER_BIND_PORT: u16 = 1088;

// Buffer sizes
/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;
/// Single-read buffer for handshake and request messages
pub const CONTROL_BUFFER_SIZE: usize = 1000;
/// Per-direction chunk size for the TCP relay
pub const RELAY_CHUNK_SIZE: usize = 1000;
/// Maximum UDP datagram size
pub const MAX_UDP_PACKET: usize = 65535;
