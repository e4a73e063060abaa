//! Newline-delimited framing
//!
//! One JSON object per line. A frame longer than `MAX_FRAME_LEN` is
//! rejected without buffering the rest of it.

use crate::error::TransportError;
use crate::transport::MAX_FRAME_LEN;
use serde::Serialize;
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Serialize a message into a single newline-terminated frame
pub fn encode_frame<M: Serialize>(msg: &M) -> Result<String, TransportError> {
    let mut frame =
        serde_json::to_string(msg).map_err(|e| TransportError::Serialization(e.to_string()))?;
    frame.push('\n');
    Ok(frame)
}

/// Read one frame
///
/// Returns `Ok(None)` on a clean EOF before any byte. A final line without
/// a trailing newline is still returned as a frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_FRAME_LEN as u64)
        .read_line(&mut line)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidData => TransportError::Deserialization(e.to_string()),
            _ => TransportError::Receive(e.to_string()),
        })?;

    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') && read >= MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLong {
            limit: MAX_FRAME_LEN,
        });
    }

    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Some(trimmed.to_string()))
}

/// Write one message as a frame and flush
pub async fn write_frame<W, M>(writer: &mut W, msg: &M) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let frame = encode_frame(msg)?;
    writer
        .write_all(frame.as_bytes())
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::Send(e.to_string()))
}
