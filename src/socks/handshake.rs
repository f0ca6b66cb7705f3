//! SOCKS5 handshake negotiation
//!
//! Reads the client's method-selection message and always answers
//! "no authentication required". The offered method list is accepted
//! unconditionally; there is no rejection path.

use super::consts::*;
use super::wire::WireReader;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Negotiate the SOCKS5 handshake on a fresh client stream.
///
/// Performs one bounded read. If the peer closed before sending
/// anything, returns `Ok(false)` and the connection is abandoned with
/// no further action. Otherwise decodes VER/NMETHODS/METHODS and
/// replies `05 00` regardless of the methods offered.
pub async fn negotiate<S>(stream: &mut S) -> Result<bool>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; CONTROL_BUFFER_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        debug!("Client closed before handshake");
        return Ok(false);
    }

    let mut reader = WireReader::new(&buf[..n]);
    let _version = reader.get_u8()?;
    let nmethods = reader.get_u8()?;
    let methods = reader.get_bytes(nmethods as usize)?;
    debug!("Client offered {} auth method(s): {:?}", nmethods, methods);

    stream
        .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE])
        .await?;
    stream.flush().await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn run_negotiate(request: &[u8]) -> (Result<bool>, Vec<u8>) {
        let (mut client, mut server) = duplex(2048);
        client.write_all(request).await.unwrap();

        let result = negotiate(&mut server).await;

        let mut reply = vec![0u8; 16];
        let n = match tokio::time::timeout(
            std::time::Duration::from_millis(100),
            client.read(&mut reply),
        )
        .await
        {
            Ok(Ok(n)) => n,
            _ => 0,
        };
        reply.truncate(n);
        (result, reply)
    }

    #[tokio::test]
    async fn test_negotiate_no_auth() {
        // VER=5, NMETHODS=1, METHODS=[0]
        let (result, reply) = run_negotiate(&[0x05, 0x01, 0x00]).await;
        assert!(result.unwrap());
        assert_eq!(reply, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn test_negotiate_accepts_any_method_list() {
        // Client only offers username/password; the reply is still 05 00
        let (result, reply) = run_negotiate(&[0x05, 0x02, 0x02, 0x01]).await;
        assert!(result.unwrap());
        assert_eq!(reply, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn test_negotiate_scripted_exchange() {
        // The mock stream asserts the exact bytes written back
        let mut stream = tokio_test::io::Builder::new()
            .read(&[0x05, 0x01, 0x00])
            .write(&[0x05, 0x00])
            .build();

        assert!(negotiate(&mut stream).await.unwrap());
    }

    #[tokio::test]
    async fn test_negotiate_peer_closed() {
        let (client, mut server) = duplex(64);
        drop(client);

        let result = negotiate(&mut server).await.unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn test_negotiate_truncated_method_list() {
        // NMETHODS claims 3 but only one method byte follows
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x03, 0x00]).await.unwrap();

        let result = negotiate(&mut server).await;
        assert!(result.is_err());
    }
}
