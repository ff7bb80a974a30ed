//! Terminator-delimited frame encoding/decoding
//!
//! Wire format: [UTF-8 text][0x00]
//! The payload itself may not contain the terminator byte.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Byte that ends every frame on the wire
pub const TERMINATOR: u8 = 0;

/// Default upper bound on a single frame's payload
pub const DEFAULT_MAX_FRAME_LEN: usize = 128;

/// Read one terminated frame from a buffered stream
///
/// Bytes past the terminator stay in the reader's buffer for the next call.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<String, TransportError> {
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            // EOF: either a clean close between frames or a truncated frame
            if !buf.is_empty() {
                tracing::debug!(pending = buf.len(), "Peer closed mid-frame");
            }
            return Err(TransportError::ConnectionClosed);
        }

        match available.iter().position(|&b| b == TERMINATOR) {
            Some(end) => {
                buf.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                break;
            }
            None => {
                let n = available.len();
                buf.extend_from_slice(available);
                reader.consume(n);
            }
        }

        if buf.len() > max_len {
            return Err(TransportError::Protocol(format!(
                "Frame too large: more than {} bytes",
                max_len
            )));
        }
    }

    if buf.len() > max_len {
        return Err(TransportError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            buf.len(),
            max_len
        )));
    }

    String::from_utf8(buf).map_err(|e| TransportError::Protocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one terminated frame to a stream
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    text: &str,
    max_len: usize,
) -> Result<(), TransportError> {
    if text.as_bytes().contains(&TERMINATOR) {
        return Err(TransportError::Protocol(
            "Message contains the frame terminator".into(),
        ));
    }
    if text.len() > max_len {
        return Err(TransportError::Protocol(format!(
            "Message too large: {} bytes (max {})",
            text.len(),
            max_len
        )));
    }

    // Payload and terminator go out in a single write
    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend_from_slice(text.as_bytes());
    frame.push(TERMINATOR);

    writer.write_all(&frame).await?;
    writer.flush().await?;

    Ok(())
}
