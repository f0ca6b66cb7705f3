//! UDP relay for SOCKS5
//!
//! Datagram encapsulation and the per-datagram exchange used by the
//! UDP ASSOCIATE path.

mod packet;
mod relay;

pub use packet::{encode_udp_packet, parse_udp_packet, UdpPacket};
pub use relay::relay_datagram;
