//! SOCKS5 request parser
//!
//! Decodes the connection request the client sends after the
//! handshake.
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```

use crate::error::SocksError;
use crate::socks::types::{SocksCommand, TargetAddr};
use crate::socks::wire::WireReader;
use tracing::debug;

/// Decode a connection request from a received buffer.
///
/// Returns the command and the destination address. Unknown command
/// bytes fail with [`SocksError::UnsupportedCommand`]; unknown address
/// tags and short buffers surface the codec errors. A failed decode
/// never yields partial data.
pub fn parse_request(buf: &[u8]) -> Result<(SocksCommand, TargetAddr), SocksError> {
    let mut reader = WireReader::new(buf);

    let _version = reader.get_u8()?;
    let cmd_byte = reader.get_u8()?;
    let _reserved = reader.get_u8()?;
    let atyp = reader.get_u8()?;

    let command =
        SocksCommand::from_byte(cmd_byte).ok_or(SocksError::UnsupportedCommand(cmd_byte))?;
    let target = TargetAddr::decode(atyp, &mut reader)?;

    debug!("Parsed SOCKS5 request: {} to {}", command, target);

    Ok((command, target))
}
