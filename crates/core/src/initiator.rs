//! Initiator role: speaks first in every round
//!
//! ```text
//!  READY ──work──▶ WORK ──send trigger──▶ SENT_TRIGGER ──▶ AWAIT_ACK
//!    ▲                                                        │
//!    └─────────────────────── ack received ◀──────────────────┘
//!  after N rounds: DONE (connection released)
//! ```

use std::fmt;
use std::time::Duration;

use lockstep_net::Connection;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::report::{Exchange, Role, RoleReport};
use crate::simulate_work;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitiatorState {
    #[default]
    Ready,
    Work,
    SentTrigger,
    AwaitAck,
    Done,
}

impl fmt::Display for InitiatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "READY",
            Self::Work => "WORK",
            Self::SentTrigger => "SENT_TRIGGER",
            Self::AwaitAck => "AWAIT_ACK",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Side that owns the accepted connection and sends the trigger each round
pub struct Initiator {
    conn: Connection,
    state: InitiatorState,
    rounds: u32,
    trigger: String,
    work_delay: Duration,
    report: RoleReport,
}

impl Initiator {
    pub fn new(conn: Connection, config: &SessionConfig) -> Self {
        Self {
            conn: conn.with_max_frame_len(config.max_message_len),
            state: InitiatorState::default(),
            rounds: config.rounds,
            trigger: config.trigger.clone(),
            work_delay: config.work_delay,
            report: RoleReport::new(Role::Initiator),
        }
    }

    pub fn state(&self) -> InitiatorState {
        self.state
    }

    /// Run every round, then release the connection.
    ///
    /// The first transport failure ends the role; the connection is dropped
    /// with `self` on that path.
    pub async fn run(mut self) -> Result<RoleReport> {
        info!(peer = %self.conn.peer_addr(), state = %self.state, "Initiator starting");

        for round in 1..=self.rounds {
            self.round(round).await?;
        }

        self.conn.close().await;
        self.transition(InitiatorState::Done);
        info!(role = %self.report.role, rounds = self.report.rounds, "Role finished");

        Ok(self.report)
    }

    async fn round(&mut self, round: u32) -> Result<()> {
        debug!(round, "Initiator round");

        simulate_work(self.work_delay).await;
        self.transition(InitiatorState::Work);

        info!(round, message = %self.trigger, "Sending trigger");
        self.conn.send(&self.trigger).await?;
        self.report.transcript.push(Exchange::Sent(self.trigger.clone()));
        self.transition(InitiatorState::SentTrigger);

        self.transition(InitiatorState::AwaitAck);
        // Any payload counts as the acknowledgment
        let reply = self.conn.receive().await?;
        info!(round, message = %reply, "Received acknowledgment");
        self.report.transcript.push(Exchange::Received(reply));
        self.report.rounds = round;
        self.transition(InitiatorState::Ready);

        Ok(())
    }

    fn transition(&mut self, next: InitiatorState) {
        debug!(from = %self.state, to = %next, "Initiator state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use lockstep_net::Listener;

    async fn linked() -> (Connection, Connection) {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr();
        let (accepted, dialed) = tokio::join!(listener.accept(), Connection::connect(addr));
        (accepted.unwrap(), dialed.unwrap())
    }

    #[tokio::test]
    async fn test_sends_trigger_then_waits_each_round() {
        let (conn, mut peer) = linked().await;
        let config = SessionConfig::loopback(3);

        let initiator = Initiator::new(conn, &config);
        assert_eq!(initiator.state(), InitiatorState::Ready);
        let task = tokio::spawn(initiator.run());

        for _ in 0..3 {
            assert_eq!(peer.receive().await.unwrap(), "PING");
            peer.send("PONG").await.unwrap();
        }

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.rounds, 3);
        assert_eq!(report.sent(), vec!["PING"; 3]);
        assert_eq!(report.received(), vec!["PONG"; 3]);
        assert!(report.alternates());

        // Connection released after the last round
        assert!(peer.receive().await.unwrap_err().is_peer_closed());
    }

    #[tokio::test]
    async fn test_never_sends_second_trigger_before_ack() {
        let (conn, mut peer) = linked().await;
        let config = SessionConfig::loopback(2);
        let task = tokio::spawn(Initiator::new(conn, &config).run());

        assert_eq!(peer.receive().await.unwrap(), "PING");

        // Withhold the ack: nothing else may arrive
        let early = tokio::time::timeout(std::time::Duration::from_millis(200), peer.receive()).await;
        assert!(early.is_err());

        peer.send("PONG").await.unwrap();
        assert_eq!(peer.receive().await.unwrap(), "PING");
        peer.send("PONG").await.unwrap();

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_ack_content_is_not_validated() {
        let (conn, mut peer) = linked().await;
        let config = SessionConfig::loopback(1);
        let task = tokio::spawn(Initiator::new(conn, &config).run());

        peer.receive().await.unwrap();
        peer.send("whatever").await.unwrap();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.received(), vec!["whatever"]);
    }

    #[tokio::test]
    async fn test_connection_released_after_own_failure() {
        let (conn, peer) = linked().await;
        let mut peer = peer.with_max_frame_len(4096);
        let config = SessionConfig::loopback(3);
        let task = tokio::spawn(Initiator::new(conn, &config).run());

        assert_eq!(peer.receive().await.unwrap(), "PING");
        // Oversized ack makes the initiator fail while the peer stays connected
        peer.send(&"x".repeat(200)).await.unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("initiator hung on oversized ack")
            .unwrap();
        assert!(matches!(
            result,
            Err(Error::Net(lockstep_net::Error::Transport(
                lockstep_net::TransportError::Protocol(_)
            )))
        ));

        let after = tokio::time::timeout(std::time::Duration::from_secs(5), peer.receive())
            .await
            .expect("initiator connection still open");
        assert!(after.unwrap_err().is_peer_closed());
    }

    #[tokio::test]
    async fn test_peer_drop_mid_session_is_fatal() {
        let (conn, mut peer) = linked().await;
        let config = SessionConfig::loopback(6);
        let task = tokio::spawn(Initiator::new(conn, &config).run());

        assert_eq!(peer.receive().await.unwrap(), "PING");
        peer.send("PONG").await.unwrap();
        assert_eq!(peer.receive().await.unwrap(), "PING");
        // Round 2 trigger seen, leave without acknowledging
        drop(peer);

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("initiator hung after peer left")
            .unwrap();

        match result {
            Err(Error::Net(e)) => assert!(e.is_peer_closed()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
