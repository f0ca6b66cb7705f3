//! Proxy server
//!
//! Owns the TCP listener and the shared UDP socket, both bound to the
//! configured endpoint. Every accepted connection gets its own
//! handshake-then-relay task; one long-lived task runs the UDP receive
//! loop and spawns a task per datagram. There is no graceful drain:
//! stopping the server abandons in-flight sessions.

use crate::config::ServerConfig;
use crate::socks::consts::MAX_UDP_PACKET;
use crate::socks::{handle_connection, relay_datagram};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// A bound SOCKS5 proxy server.
pub struct Server {
    listener: TcpListener,
    udp_socket: Arc<UdpSocket>,
    request_timeout: Option<Duration>,
    udp_limiter: Option<Arc<Semaphore>>,
}

impl Server {
    /// Bind the TCP listener and UDP socket per `config`.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let endpoint = config.endpoint();

        let listener = TcpListener::bind(&endpoint)
            .await
            .with_context(|| format!("Failed to bind TCP listener on {}", endpoint))?;
        let udp_socket = UdpSocket::bind(&endpoint)
            .await
            .with_context(|| format!("Failed to bind UDP socket on {}", endpoint))?;

        Ok(Server {
            listener,
            udp_socket: Arc::new(udp_socket),
            request_timeout: config.request_timeout(),
            udp_limiter: config
                .udp_max_inflight
                .map(|cap| Arc::new(Semaphore::new(cap))),
        })
    }

    /// Address the TCP listener is bound to.
    pub fn tcp_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Address the shared UDP socket is bound to.
    pub fn udp_addr(&self) -> Result<SocketAddr> {
        Ok(self.udp_socket.local_addr()?)
    }

    /// Accept connections and relay datagrams until dropped.
    pub async fn run(self) -> Result<()> {
        let tcp_addr = self.tcp_addr()?;
        let udp_addr = self.udp_addr()?;
        info!("SOCKS5 server listening on {} (tcp/udp)", tcp_addr);

        let mut udp_loop = tokio::spawn(udp_receive_loop(
            self.udp_socket.clone(),
            self.request_timeout,
            self.udp_limiter.clone(),
        ));

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        let timeout = self.request_timeout;
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, udp_addr, timeout).await {
                                debug!("Session from {} ended with error: {:#}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        // Transient accept failures must not kill the loop
                        error!("Accept error: {}", e);
                    }
                },
                result = &mut udp_loop => {
                    result.context("UDP receive loop panicked")?;
                    anyhow::bail!("UDP receive loop terminated unexpectedly");
                }
            }
        }
    }
}

/// Receive datagrams on the shared socket and spawn one exchange per
/// datagram, optionally gated by the in-flight cap.
async fn udp_receive_loop(
    socket: Arc<UdpSocket>,
    timeout: Option<Duration>,
    limiter: Option<Arc<Semaphore>>,
) {
    let mut buf = vec![0u8; MAX_UDP_PACKET];
    loop {
        let (len, src_addr) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("UDP recv error: {}", e);
                continue;
            }
        };

        let permit = match &limiter {
            Some(semaphore) => match semaphore.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                // The semaphore is never closed
                Err(_) => continue,
            },
            None => None,
        };

        let datagram = buf[..len].to_vec();
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Err(e) = relay_datagram(socket, src_addr, datagram, timeout).await {
                debug!("UDP exchange for {} failed: {:#}", src_addr, e);
            }
            drop(permit);
        });
    }
}
