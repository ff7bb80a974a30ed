//! Network error types

use std::io;
use std::net::SocketAddr;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
///
/// One variant per lifecycle step, so callers can tell a failed bind apart
/// from a peer that went away mid-session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("listen on {addr} failed: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failures while moving messages over an established link
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not connected")]
    NotConnected,
}

impl Error {
    /// True if this is a transport failure caused by the peer closing the link
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Error::Transport(TransportError::ConnectionClosed))
    }
}
