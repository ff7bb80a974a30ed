//! Single-peer listening endpoint
//!
//! The endpoint binds with a backlog of one and hands out a [`Connection`]
//! per accepted peer. A [`ListenerCloser`] lets another task abort a pending
//! accept.

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::{Error, Result};

/// Pending connection queue length
const BACKLOG: u32 = 1;

/// Bound, listening stream socket
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    addr: SocketAddr,
    closed_rx: watch::Receiver<bool>,
    closed_tx: watch::Sender<bool>,
}

/// Handle that forcibly closes a [`Listener`] from elsewhere
#[derive(Debug, Clone)]
pub struct ListenerCloser {
    closed_tx: watch::Sender<bool>,
}

impl ListenerCloser {
    /// Fail any pending and future `accept` calls
    pub fn close(&self) {
        self.closed_tx.send_replace(true);
        info!("Listener close requested");
    }
}

impl Listener {
    /// Bind and start listening on `addr`
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|source| Error::Bind { addr, source })?;

        // Lets a restarted run reuse a port still in TIME_WAIT; an active
        // listener on the same port still makes bind fail.
        socket
            .set_reuseaddr(true)
            .map_err(|source| Error::Bind { addr, source })?;
        socket
            .bind(addr)
            .map_err(|source| Error::Bind { addr, source })?;

        let inner = socket
            .listen(BACKLOG)
            .map_err(|source| Error::Listen { addr, source })?;
        let bound = inner
            .local_addr()
            .map_err(|source| Error::Listen { addr, source })?;

        info!(addr = %bound, "Listening");

        let (closed_tx, closed_rx) = watch::channel(false);
        Ok(Self {
            inner,
            addr: bound,
            closed_rx,
            closed_tx,
        })
    }

    /// The address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for closing this listener from another task
    pub fn closer(&self) -> ListenerCloser {
        ListenerCloser {
            closed_tx: self.closed_tx.clone(),
        }
    }

    /// Block until one peer connects
    pub async fn accept(&self) -> Result<Connection> {
        let mut closed_rx = self.closed_rx.clone();
        if *closed_rx.borrow_and_update() {
            return Err(Error::Accept(listener_closed()));
        }

        tokio::select! {
            result = self.inner.accept() => {
                let (stream, peer) = result.map_err(Error::Accept)?;
                let conn = Connection::from_stream(stream).map_err(Error::Accept)?;
                info!(addr = %self.addr, peer = %peer, "Accepted peer");
                Ok(conn)
            }
            _ = wait_closed(&mut closed_rx) => {
                debug!(addr = %self.addr, "Accept aborted");
                Err(Error::Accept(listener_closed()))
            }
        }
    }
}

async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    // Sender lives in the listener itself, so `changed` only errors once it is gone
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn listener_closed() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, "listener closed")
}
