//! Lockstep Network Library
//!
//! Owning TCP primitives for a single-peer, turn-taking session.
//!
//! # Architecture
//!
//! - **Listener**: binds with a backlog of one, accepts a single peer
//! - **Connection**: owns one stream socket, sends and receives text messages
//! - **Frame**: each message is UTF-8 text followed by a NUL terminator
//!
//! # Usage
//!
//! ```ignore
//! let listener = Listener::bind("0.0.0.0:9889".parse()?).await?;
//! let mut conn = listener.accept().await?;
//!
//! conn.send("PING").await?;
//! let reply = conn.receive().await?;
//! ```

pub mod connection;
pub mod error;
pub mod frame;
pub mod listener;

pub use connection::Connection;
pub use error::{Error, Result, TransportError};
pub use listener::{Listener, ListenerCloser};
