//! UDP datagram encapsulation for SOCKS5
//!
//! Each datagram on the relay socket carries a header naming the real
//! destination, followed by the opaque payload:
//!
//! ```text
//! +----+------+------+----------+----------+----------+
//! |RSV | FRAG | ATYP | DST.ADDR | DST.PORT |   DATA   |
//! +----+------+------+----------+----------+----------+
//! | 2  |  1   |  1   | Variable |    2     | Variable |
//! +----+------+------+----------+----------+----------+
//! ```

use crate::error::SocksError;
use crate::socks::types::TargetAddr;
use crate::socks::wire::{WireReader, WireWriter};
use bytes::Bytes;

/// A decoded SOCKS5 UDP datagram.
#[derive(Debug, Clone)]
pub struct UdpPacket {
    /// Fragment number (0 for standalone datagrams)
    pub frag: u8,
    /// Destination (outbound) or original destination (replies)
    pub addr: TargetAddr,
    /// Opaque payload
    pub data: Bytes,
}

impl UdpPacket {
    /// Create an unfragmented packet.
    pub fn new(addr: TargetAddr, data: Bytes) -> Self {
        UdpPacket {
            frag: 0,
            addr,
            data,
        }
    }

    /// True when the fragment field is non-zero.
    pub fn is_fragmented(&self) -> bool {
        self.frag != 0
    }
}

/// Parse a UDP relay datagram.
///
/// Fails on a short buffer or a non-zero reserved field; never
/// returns partial data.
pub fn parse_udp_packet(buf: &[u8]) -> Result<UdpPacket, SocksError> {
    let mut reader = WireReader::new(buf);

    let rsv = reader.get_u16()?;
    if rsv != 0 {
        return Err(SocksError::InvalidReserved(rsv));
    }
    let frag = reader.get_u8()?;
    let atyp = reader.get_u8()?;

    let addr = TargetAddr::decode(atyp, &mut reader)?;
    let data = Bytes::copy_from_slice(reader.rest());

    Ok(UdpPacket { frag, addr, data })
}

/// Encode a UDP relay datagram.
pub fn encode_udp_packet(packet: &UdpPacket) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer
        .put_u16(0)
        .put_u8(packet.frag)
        .put_bytes(&packet.addr.to_bytes())
        .put_bytes(&packet.data);
    writer.into_bytes()
}
