//! Responder role: listens first in every round

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use lockstep_net::Connection;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::report::{Exchange, Role, RoleReport};
use crate::simulate_work;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponderState {
    #[default]
    Sleep,
    AwaitTrigger,
    Ready,
    Work,
    SentAck,
    Done,
}

impl fmt::Display for ResponderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sleep => "SLEEP",
            Self::AwaitTrigger => "AWAIT_TRIGGER",
            Self::Ready => "READY",
            Self::Work => "WORK",
            Self::SentAck => "SENT_ACK",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Side that dials the endpoint and answers each trigger
pub struct Responder {
    conn: Connection,
    state: ResponderState,
    rounds: u32,
    ack: String,
    work_delay: Duration,
    report: RoleReport,
}

impl Responder {
    /// Wait the fixed dial delay, then make one connection attempt to `addr`.
    ///
    /// The delay only gives the endpoint time to start listening; a refused
    /// dial is returned as-is.
    pub async fn dial(addr: SocketAddr, config: &SessionConfig) -> Result<Self> {
        debug!(addr = %addr, delay = ?config.dial_delay, "Waiting before dial");
        tokio::time::sleep(config.dial_delay).await;

        let conn = Connection::connect(addr).await?;
        Ok(Self::new(conn, config))
    }

    pub fn new(conn: Connection, config: &SessionConfig) -> Self {
        Self {
            conn: conn.with_max_frame_len(config.max_message_len),
            state: ResponderState::default(),
            rounds: config.rounds,
            ack: config.ack.clone(),
            work_delay: config.work_delay,
            report: RoleReport::new(Role::Responder),
        }
    }

    pub fn state(&self) -> ResponderState {
        self.state
    }

    /// Answer every round, then release the connection
    pub async fn run(mut self) -> Result<RoleReport> {
        info!(peer = %self.conn.peer_addr(), state = %self.state, "Responder starting");

        for round in 1..=self.rounds {
            self.round(round).await?;
        }

        self.conn.close().await;
        self.transition(ResponderState::Done);
        info!(role = %self.report.role, rounds = self.report.rounds, "Role finished");

        Ok(self.report)
    }

    async fn round(&mut self, round: u32) -> Result<()> {
        debug!(round, "Responder round");

        if self.state == ResponderState::Sleep {
            self.transition(ResponderState::AwaitTrigger);
        }
        let trigger = self.conn.receive().await?;
        info!(round, message = %trigger, "Received trigger");
        self.report.transcript.push(Exchange::Received(trigger));
        self.transition(ResponderState::Ready);

        simulate_work(self.work_delay).await;
        self.transition(ResponderState::Work);

        info!(round, message = %self.ack, "Sending acknowledgment");
        self.conn.send(&self.ack).await?;
        self.report.transcript.push(Exchange::Sent(self.ack.clone()));
        self.report.rounds = round;
        self.transition(ResponderState::SentAck);
        self.transition(ResponderState::AwaitTrigger);

        Ok(())
    }

    fn transition(&mut self, next: ResponderState) {
        debug!(from = %self.state, to = %next, "Responder state");
        self.state = next;
    }
}
