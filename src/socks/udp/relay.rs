//! Per-datagram UDP relay
//!
//! Each inbound datagram on the shared relay socket is one independent
//! exchange: decode the SOCKS5 encapsulation, open an ephemeral socket
//! to the destination, perform a single send/receive round trip, and
//! relay the answer back to the original sender wrapped in a header
//! naming the original destination. No per-client session state
//! survives the exchange.

use super::packet::{encode_udp_packet, parse_udp_packet, UdpPacket};
use crate::socks::consts::MAX_UDP_PACKET;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Handle one inbound datagram.
///
/// `datagram` is the raw bytes received from `src_addr` on the shared
/// socket; the answer is sent back through that same socket. When
/// `timeout` is set, the wait for the destination's reply is bounded;
/// by default it is not.
pub async fn relay_datagram(
    server_sock: Arc<UdpSocket>,
    src_addr: SocketAddr,
    datagram: Vec<u8>,
    timeout: Option<Duration>,
) -> Result<()> {
    let packet = parse_udp_packet(&datagram).context("Invalid SOCKS5 UDP datagram")?;

    if packet.is_fragmented() {
        warn!("Fragmented UDP datagrams not supported, dropping");
        return Ok(());
    }

    if packet.addr.is_ipv6() {
        warn!("IPv6 UDP destination {} rejected", packet.addr);
        return Ok(());
    }

    let target = packet
        .addr
        .resolve()
        .await
        .with_context(|| format!("Failed to resolve UDP target: {}", packet.addr))?;

    // One ephemeral socket per exchange, discarded afterwards.
    let sock = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("Failed to bind ephemeral UDP socket")?;
    sock.connect(target)
        .await
        .with_context(|| format!("Failed to connect UDP socket to {}", target))?;
    sock.send(&packet.data)
        .await
        .with_context(|| format!("UDP send to {} failed", target))?;

    debug!("UDP relay: sent {} bytes to {}", packet.data.len(), target);

    let mut recv_buf = vec![0u8; MAX_UDP_PACKET];
    let len = match timeout {
        Some(limit) => tokio::time::timeout(limit, sock.recv(&mut recv_buf))
            .await
            .with_context(|| format!("UDP response timeout for {}", target))??,
        None => sock.recv(&mut recv_buf).await?,
    };

    debug!("UDP relay: received {} bytes from {}", len, target);

    // The reply header carries the original destination, not the
    // ephemeral socket's view of the peer.
    let reply = UdpPacket::new(packet.addr, Bytes::copy_from_slice(&recv_buf[..len]));
    server_sock
        .send_to(&encode_udp_packet(&reply), src_addr)
        .await
        .context("Failed to send UDP reply to client")?;

    Ok(())
}
