//! Session configuration
//!
//! Everything both roles must agree on before the first byte is sent. Values
//! are fixed once the config is handed to the orchestrator.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use lockstep_net::frame::DEFAULT_MAX_FRAME_LEN;

/// Default port for Lockstep sessions
pub const DEFAULT_PORT: u16 = 9889;

/// Number of trigger/acknowledge rounds per session
pub const DEFAULT_ROUNDS: u32 = 6;

/// Token the initiator sends to start a round
pub const TRIGGER: &str = "PING";

/// Token the responder sends to finish a round
pub const ACK: &str = "PONG";

/// Parameters shared by both roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interface the listening endpoint binds to
    pub bind_ip: IpAddr,
    /// Host the responder dials
    pub dial_ip: IpAddr,
    /// Port for both sides; 0 picks an ephemeral port
    pub port: u16,
    /// Rounds to run before both sides stop
    pub rounds: u32,
    /// Message the initiator opens each round with
    pub trigger: String,
    /// Message the responder closes each round with
    pub ack: String,
    /// Simulated work performed once per round by each role
    pub work_delay: Duration,
    /// Pause before the responder's single dial attempt
    pub dial_delay: Duration,
    /// Largest message either side will send or accept
    pub max_message_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            dial_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            rounds: DEFAULT_ROUNDS,
            trigger: TRIGGER.to_string(),
            ack: ACK.to_string(),
            work_delay: Duration::from_secs(1),
            dial_delay: Duration::from_secs(1),
            max_message_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl SessionConfig {
    /// Loopback config on an ephemeral port with no artificial delays
    pub fn loopback(rounds: u32) -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            rounds,
            work_delay: Duration::ZERO,
            dial_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Address the listening endpoint binds
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Address the responder dials once the endpoint is bound on `port`
    pub fn dial_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.dial_ip, port)
    }
}
