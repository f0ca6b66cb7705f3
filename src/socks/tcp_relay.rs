//! Bidirectional TCP relay for the CONNECT command
//!
//! Runs two independent copy directions between the client and the
//! upstream socket. Each direction reads bounded chunks from one
//! stream and writes them unchanged to the other; no socket is ever
//! written to by more than one task. When either direction ends, the
//! sibling is cancelled through a token observed at its next
//! suspension point; cancelling an already-finished direction is a
//! no-op.

use crate::socks::consts::RELAY_CHUNK_SIZE;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Relay bytes between two already-open streams until both directions
/// have stopped.
pub async fn relay<A, B>(client: A, upstream: B) -> Result<()>
where
    A: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (upstream_read, upstream_write) = tokio::io::split(upstream);

    let token = CancellationToken::new();

    let mut up = tokio::spawn(copy_direction(
        client_read,
        upstream_write,
        token.clone(),
        "client->upstream",
    ));
    let mut down = tokio::spawn(copy_direction(
        upstream_read,
        client_write,
        token.clone(),
        "upstream->client",
    ));

    // Wait for either direction, then cancel the sibling. The token is
    // idempotent: if the sibling already finished, this does nothing.
    tokio::select! {
        _ = &mut up => {
            token.cancel();
            let _ = down.await;
        }
        _ = &mut down => {
            token.cancel();
            let _ = up.await;
        }
    }

    // Both halves have been dropped; the session is over.
    Ok(())
}

/// Copy one direction until EOF, reset, or cancellation.
async fn copy_direction<R, W>(
    mut from: R,
    mut to: W,
    token: CancellationToken,
    label: &'static str,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; RELAY_CHUNK_SIZE];
    loop {
        let n = tokio::select! {
            _ = token.cancelled() => {
                debug!("{}: cancelled", label);
                return;
            }
            result = from.read(&mut buf) => match result {
                Ok(0) => {
                    // Graceful close: half-close the other socket's
                    // write side. A failure here means the peer is
                    // already gone.
                    debug!("{}: peer closed", label);
                    if let Err(e) = to.shutdown().await {
                        debug!("{}: shutdown after close failed: {}", label, e);
                    }
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!("{}: read failed: {}", label, e);
                    if let Err(e) = to.shutdown().await {
                        debug!("{}: shutdown after reset failed: {}", label, e);
                    }
                    return;
                }
            },
        };

        if let Err(e) = to.write_all(&buf[..n]).await {
            debug!("{}: write failed: {}", label, e);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::net::{TcpListener, TcpStream};

    #[tokio::test]
    async fn test_relay_forwards_both_directions() {
        let (mut client, relay_client) = duplex(4096);
        let (mut upstream, relay_upstream) = duplex(4096);

        let handle = tokio::spawn(relay(relay_client, relay_upstream));

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        upstream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        upstream.write_all(b"pong").await.unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");

        drop(client);
        drop(upstream);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_relay_terminates_on_client_close() {
        let (mut client, relay_client) = duplex(4096);
        let (mut upstream, relay_upstream) = duplex(4096);

        let handle = tokio::spawn(relay(relay_client, relay_upstream));

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        upstream.read_exact(&mut buf).await.unwrap();

        // Client closes; the upstream write side is half-closed and
        // both directions stop.
        drop(client);

        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(1), upstream.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_relay_large_transfer_chunked() {
        let (mut client, relay_client) = duplex(65536);
        let (mut upstream, relay_upstream) = duplex(65536);

        let handle = tokio::spawn(relay(relay_client, relay_upstream));

        // Larger than any single chunk
        let data = vec![0xAB; 50_000];
        let writer = {
            let data = data.clone();
            tokio::spawn(async move {
                client.write_all(&data).await.unwrap();
                drop(client);
            })
        };

        let mut received = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), upstream.read_to_end(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, data);

        writer.await.unwrap();
        drop(upstream);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_relay_half_close_propagates_to_tcp_peer() {
        // Real sockets so the half-close is observable as EOF.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            sock
        });
        let upstream_client = TcpStream::connect(addr).await.unwrap();
        let mut upstream_peer = accept.await.unwrap();

        let (mut client, relay_client) = duplex(4096);
        let handle = tokio::spawn(relay(relay_client, upstream_client));

        client.write_all(b"data").await.unwrap();
        let mut buf = [0u8; 4];
        upstream_peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"data");

        drop(client);

        // EOF on the upstream peer proves the write side was shut down
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(1), upstream_peer.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());

        drop(upstream_peer);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_relay_no_traffic_then_close() {
        let (client, relay_client) = duplex(1024);
        let (upstream, relay_upstream) = duplex(1024);

        let handle = tokio::spawn(relay(relay_client, relay_upstream));

        drop(client);
        drop(upstream);

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }
}
