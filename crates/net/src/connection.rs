//! Owning handle over a single TCP link
//!
//! A [`Connection`] is produced by [`crate::Listener::accept`] or
//! [`Connection::connect`] and is moved, never shared, between the tasks that
//! use it. The socket is released exactly once: on [`Connection::close`] or
//! when the handle is dropped, whichever comes first.

use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{Error, Result, TransportError};
use crate::frame::{read_frame, write_frame, DEFAULT_MAX_FRAME_LEN};

/// Exclusive owner of one stream socket
#[derive(Debug)]
pub struct Connection {
    /// `None` once the socket has been released
    stream: Option<BufReader<TcpStream>>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    max_frame_len: usize,
}

impl Connection {
    /// Dial `addr` once. No retry is attempted.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        debug!(addr = %addr, "Connecting");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| Error::Connect { addr, source })?;
        let conn = Self::from_stream(stream).map_err(|source| Error::Connect { addr, source })?;
        info!(local = %conn.local_addr, peer = %conn.peer_addr, "Connected");
        Ok(conn)
    }

    /// Take ownership of an already established stream
    pub(crate) fn from_stream(stream: TcpStream) -> std::io::Result<Self> {
        // Messages are tiny and strictly alternating; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let local_addr = stream.local_addr()?;
        Ok(Self {
            stream: Some(BufReader::new(stream)),
            peer_addr,
            local_addr,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        })
    }

    /// Override the maximum accepted/sent message length
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Address of the remote end
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Address of the local end
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the handle still owns its socket
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one message. `text` must not contain the frame terminator.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let max_len = self.max_frame_len;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        write_frame(stream, text, max_len).await?;
        debug!(peer = %self.peer_addr, message = text, "Sent");
        Ok(())
    }

    /// Block until one full message arrives and return it without the terminator
    pub async fn receive(&mut self) -> Result<String> {
        let max_len = self.max_frame_len;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let text = read_frame(stream, max_len).await?;
        debug!(peer = %self.peer_addr, message = %text, "Received");
        Ok(text)
    }

    /// Release the socket now. Calling this again is a no-op.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // Best effort: the peer may already be gone
            if let Err(e) = stream.get_mut().shutdown().await {
                debug!(peer = %self.peer_addr, error = %e, "Shutdown failed");
            }
            debug!(peer = %self.peer_addr, "Connection closed");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!(peer = %self.peer_addr, "Connection released on drop");
        }
    }
}
