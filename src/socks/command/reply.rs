//! SOCKS5 reply builder
//!
//! Constructs and sends the connection reply:
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```
//!
//! CONNECT replies always report success with a fixed placeholder
//! bound endpoint (0.0.0.0:1088) rather than the true local socket.
//! UDP ASSOCIATE replies carry the server's real UDP endpoint so the
//! client knows where to send datagrams.

use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use crate::socks::wire::WireWriter;
use anyhow::Result;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode the fixed placeholder success reply for CONNECT.
pub fn connect_reply_bytes() -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer
        .put_u8(SOCKS5_VERSION)
        .put_u8(SOCKS5_REPLY_SUCCEEDED)
        .put_u8(SOCKS5_RESERVED)
        .put_u8(SOCKS5_ADDR_TYPE_IPV4)
        .put_bytes(&PLACEHOLDER_BIND_ADDR)
        .put_u16(PLACEHOLDER_BIND_PORT);
    writer.into_bytes()
}

/// Encode a success reply bound to a real socket address.
pub fn associate_reply_bytes(bind_addr: SocketAddr) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer
        .put_u8(SOCKS5_VERSION)
        .put_u8(SOCKS5_REPLY_SUCCEEDED)
        .put_u8(SOCKS5_RESERVED)
        .put_bytes(&TargetAddr::from(bind_addr).to_bytes());
    writer.into_bytes()
}

/// Send the placeholder CONNECT success reply.
pub async fn send_connect_reply<S>(stream: &mut S) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&connect_reply_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Send the UDP ASSOCIATE success reply carrying `bind_addr`.
pub async fn send_associate_reply<S>(stream: &mut S, bind_addr: SocketAddr) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&associate_reply_bytes(bind_addr)).await?;
    stream.flush().await?;
    Ok(())
}
