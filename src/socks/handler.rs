//! Per-connection SOCKS5 orchestration
//!
//! Drives one accepted connection through the handshake, the request,
//! and the chosen command. Failures close the connection silently;
//! the client never sees an error beyond the channel closing.

use crate::error::SocksError;
use crate::socks::command::{parse_request, send_associate_reply, send_connect_reply};
use crate::socks::consts::CONTROL_BUFFER_SIZE;
use crate::socks::handshake::negotiate;
use crate::socks::tcp_relay::relay;
use crate::socks::types::{SocksCommand, TargetAddr};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Handle one SOCKS5 connection end to end.
///
/// `udp_endpoint` is the server's shared UDP socket address, reported
/// in UDP ASSOCIATE replies. `request_timeout` optionally bounds the
/// upstream connect; by default there is no deadline.
pub async fn handle_connection<S>(
    mut stream: S,
    udp_endpoint: SocketAddr,
    request_timeout: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    if !negotiate(&mut stream).await? {
        return Ok(());
    }

    let mut buf = [0u8; CONTROL_BUFFER_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        debug!("Client closed before sending a request");
        return Ok(());
    }

    let (command, target) = parse_request(&buf[..n])?;
    info!("SOCKS5 {} request to {}", command, target);

    match command {
        SocksCommand::Connect => handle_connect(stream, target, request_timeout).await,
        SocksCommand::UdpAssociate => handle_udp_associate(stream, udp_endpoint).await,
        SocksCommand::Bind => {
            // Unsupported; close without a reply.
            Err(SocksError::UnsupportedCommand(SocksCommand::Bind.to_byte()).into())
        }
    }
}

/// CONNECT: open the upstream connection, send the placeholder success
/// reply, and relay until both directions stop.
///
/// A failed connect closes the client silently with no SOCKS5 failure
/// reply, matching the baseline behavior.
async fn handle_connect<S>(
    mut stream: S,
    target: TargetAddr,
    request_timeout: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let upstream = match connect_upstream(&target, request_timeout).await {
        Ok(upstream) => upstream,
        Err(e) => {
            debug!("Failed to connect to {}: {:#}", target, e);
            return Ok(());
        }
    };

    send_connect_reply(&mut stream).await?;
    debug!("Relay established to {}", target);

    relay(stream, upstream).await
}

async fn connect_upstream(
    target: &TargetAddr,
    request_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let addr = target.resolve().await?;
    let upstream = match request_timeout {
        Some(limit) => tokio::time::timeout(limit, TcpStream::connect(addr))
            .await
            .with_context(|| format!("Connect timeout to {}", addr))??,
        None => TcpStream::connect(addr).await?,
    };
    Ok(upstream)
}

/// UDP ASSOCIATE: tell the client where the relay socket lives, then
/// hold the control channel open until the client closes it.
///
/// The control channel carries no further protocol after the reply;
/// any non-empty read is a protocol violation scoped to this one
/// connection.
async fn handle_udp_associate<S>(mut stream: S, udp_endpoint: SocketAddr) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_associate_reply(&mut stream, udp_endpoint).await?;
    debug!("UDP association opened, relay endpoint {}", udp_endpoint);

    let mut buf = [0u8; CONTROL_BUFFER_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        debug!("UDP association closed by client");
        return Ok(());
    }
    Err(SocksError::UnexpectedControlData(n).into())
}
