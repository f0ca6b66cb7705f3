//! SOCKS5 protocol engine
//!
//! Binary message codec, the handshake/request state machine, the
//! bidirectional TCP relay, and the per-datagram UDP relay. The
//! server module wires these onto real sockets.

pub mod command;
pub mod consts;
mod handler;
pub mod handshake;
pub mod tcp_relay;
pub mod types;
pub mod udp;
pub mod wire;

pub use command::{connect_reply_bytes, parse_request};
pub use handler::handle_connection;
pub use handshake::negotiate;
pub use tcp_relay::relay;
pub use types::{SocksCommand, TargetAddr};
pub use udp::{encode_udp_packet, parse_udp_packet, relay_datagram, UdpPacket};
