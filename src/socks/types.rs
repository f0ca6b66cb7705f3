//! SOCKS5 type definitions
//!
//! The command and destination-address types shared by the request,
//! reply, and UDP datagram paths.

use super::consts::*;
use super::wire::{WireReader, WireWriter};
use crate::error::SocksError;
use anyhow::{Context, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to the target
    Connect,
    /// TCP BIND - wait for an incoming connection (not implemented)
    Bind,
    /// UDP ASSOCIATE - establish a UDP relay
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into a SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }

    /// Convert a SocksCommand to its command byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Destination address of a SOCKS5 request or UDP datagram.
///
/// Either an IP address (v4 or v6) or a domain name, always paired
/// with a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a TargetAddr from a domain name and port
    pub fn domain(domain: String, port: u16) -> Self {
        TargetAddr::Domain(domain, port)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the SOCKS5 address type byte
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// True for IPv6 destinations, which the UDP relay rejects.
    pub fn is_ipv6(&self) -> bool {
        matches!(self, TargetAddr::Ip(SocketAddr::V6(_)))
    }

    /// Decode the ATYP-tagged address and port from a wire cursor.
    ///
    /// The address layout depends on the tag that precedes it: 4 raw
    /// bytes for IPv4, a length-prefixed name for a domain, 16 raw
    /// bytes for IPv6. Unknown tags and short buffers fail without
    /// consuming the message.
    pub fn decode(atyp: u8, reader: &mut WireReader<'_>) -> Result<Self, SocksError> {
        match atyp {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(reader.get_bytes(4)?);
                let port = reader.get_u16()?;
                Ok(TargetAddr::ipv4(Ipv4Addr::from(octets), port))
            }

            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = reader.get_u8()? as usize;
                let name = reader.get_bytes(len)?;
                let domain = String::from_utf8(name.to_vec())
                    .map_err(|e| SocksError::InvalidDomain(e.to_string()))?;
                let port = reader.get_u16()?;
                Ok(TargetAddr::domain(domain, port))
            }

            SOCKS5_ADDR_TYPE_IPV6 => {
                // 16 raw bytes per the protocol layout; the original
                // implementation read 16 two-byte words here, treated
                // as a defect rather than behavior to reproduce.
                let mut octets = [0u8; 16];
                octets.copy_from_slice(reader.get_bytes(16)?);
                let port = reader.get_u16()?;
                Ok(TargetAddr::ipv6(Ipv6Addr::from(octets), port))
            }

            other => Err(SocksError::UnsupportedAddressType(other)),
        }
    }

    /// Encode as ATYP + address + port, the inverse of [`decode`].
    ///
    /// [`decode`]: TargetAddr::decode
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();

        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                writer.put_u8(SOCKS5_ADDR_TYPE_IPV4);
                writer.put_bytes(&addr.ip().octets());
                writer.put_u16(addr.port());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                writer.put_u8(SOCKS5_ADDR_TYPE_IPV6);
                writer.put_bytes(&addr.ip().octets());
                writer.put_u16(addr.port());
            }
            TargetAddr::Domain(domain, port) => {
                // One length byte on the wire: names longer than 255
                // bytes are truncated so prefix and bytes stay
                // consistent.
                let name = &domain.as_bytes()[..domain.len().min(MAX_DOMAIN_LEN)];
                writer.put_u8(SOCKS5_ADDR_TYPE_DOMAIN);
                writer.put_u8(name.len() as u8);
                writer.put_bytes(name);
                writer.put_u16(*port);
            }
        }

        writer.into_bytes()
    }

    /// Resolve the address to a SocketAddr.
    ///
    /// IP addresses return immediately; domain names go through DNS.
    pub async fn resolve(&self) -> Result<SocketAddr> {
        match self {
            TargetAddr::Ip(addr) => Ok(*addr),
            TargetAddr::Domain(domain, port) => {
                let addr_str = format!("{}:{}", domain, port);
                let resolved = tokio::net::lookup_host(&addr_str)
                    .await
                    .with_context(|| format!("Failed to resolve domain: {}", domain))?
                    .next()
                    .with_context(|| format!("No addresses found for domain: {}", domain))?;
                Ok(resolved)
            }
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}
