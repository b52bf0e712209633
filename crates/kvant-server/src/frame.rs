//! Length-prefixed framing over a duplex byte stream.
//!
//! Each message is a 4-byte big-endian unsigned length followed by that
//! many payload bytes. Payloads are uninterpreted at this layer.

use std::io::{self, Read, Write};

use crate::error::{ServerError, ServerResult};

/// Width of the length prefix in bytes.
pub const LEN_PREFIX: usize = 4;

/// Write one framed payload.
pub fn send(stream: &mut impl Write, payload: &[u8]) -> ServerResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| ServerError::FrameTooLarge {
        len: payload.len(),
        limit: u32::MAX as usize,
    })?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(payload)?;
    stream.flush()?;
    Ok(())
}

/// Read one framed payload, rejecting frames longer than `max_len`.
pub fn recv(stream: &mut impl Read, max_len: usize) -> ServerResult<Vec<u8>> {
    let mut prefix = [0u8; LEN_PREFIX];
    read_exact(stream, &mut prefix)?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_len {
        return Err(ServerError::FrameTooLarge {
            len,
            limit: max_len,
        });
    }
    let mut payload = vec![0u8; len];
    read_exact(stream, &mut payload)?;
    Ok(payload)
}

fn read_exact(stream: &mut impl Read, buf: &mut [u8]) -> ServerResult<()> {
    stream.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => ServerError::TransportClosed,
        _ => ServerError::Io(err),
    })
}
