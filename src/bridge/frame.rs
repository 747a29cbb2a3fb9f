//! Length-prefixed framing for the bridge socket.
//!
//! Every message travels as a 4-byte big-endian length prefix followed by
//! that many bytes of UTF-8 JSON. The prefix counts the payload only, not
//! itself.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::bridge::BridgeError;

/// Largest payload either side accepts, in bytes.
///
/// The length prefix is validated against this before any buffer is
/// allocated, so a garbage or hostile prefix cannot force a huge
/// allocation.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Frame a payload: 4-byte big-endian length prefix + payload bytes.
#[must_use]
pub fn frame_payload(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Write one framed payload and flush.
pub async fn write_frame<W>(stream: &mut W, payload: &[u8]) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_SIZE {
        return Err(BridgeError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    stream
        .write_all(&frame_payload(payload))
        .await
        .map_err(connection_lost)?;
    stream.flush().await.map_err(connection_lost)?;
    Ok(())
}

/// Read one complete frame and return its payload.
pub async fn read_frame<R>(stream: &mut R) -> Result<Vec<u8>, BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.map_err(connection_lost)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(BridgeError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(connection_lost)?;
    Ok(payload)
}

fn connection_lost(err: std::io::Error) -> BridgeError {
    BridgeError::ConnectionLost {
        message: err.to_string(),
    }
}
