//! Session wiring
//!
//! Binds the endpoint, spawns the responder as its own task, runs the
//! initiator on the accepted connection and joins the responder. The first
//! failure from either side ends the session; the other side is dropped with
//! its connection.

use lockstep_net::Listener;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::initiator::Initiator;
use crate::report::{RoleReport, SessionReport};
use crate::responder::Responder;

pub struct Orchestrator {
    config: SessionConfig,
}

impl Orchestrator {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bind the endpoint and run one full session
    pub async fn run(&self) -> Result<SessionReport> {
        let listener = Listener::bind(self.config.bind_addr()).await?;
        self.run_with(listener).await
    }

    /// Run one session on an endpoint that is already bound
    pub async fn run_with(&self, listener: Listener) -> Result<SessionReport> {
        let dial_addr = self.config.dial_addr(listener.local_addr().port());

        let config = self.config.clone();
        let mut responder: JoinHandle<Result<RoleReport>> = tokio::spawn(async move {
            let responder = Responder::dial(dial_addr, &config).await?;
            responder.run().await
        });

        // A responder that never connects must not leave us stuck in accept
        let conn = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    responder.abort();
                    return Err(e.into());
                }
            },
            joined = &mut responder => {
                let err = match flatten(joined) {
                    Err(e) => e,
                    Ok(_) => Error::ResponderAborted("finished without connecting".into()),
                };
                error!(error = %err, "Responder failed before connecting");
                return Err(err);
            }
        };

        let initiator = Initiator::new(conn, &self.config).run();
        tokio::pin!(initiator);

        tokio::select! {
            result = &mut initiator => match result {
                Ok(initiator) => {
                    let responder = flatten(responder.await)?;
                    info!(rounds = initiator.rounds, "Session complete");
                    Ok(SessionReport { initiator, responder })
                }
                Err(e) => {
                    error!(error = %e, "Initiator failed");
                    responder.abort();
                    Err(e)
                }
            },
            joined = &mut responder => match flatten(joined) {
                Ok(responder) => {
                    let initiator = initiator.await?;
                    info!(rounds = initiator.rounds, "Session complete");
                    Ok(SessionReport { initiator, responder })
                }
                Err(e) => {
                    // Dropping the initiator future releases its connection
                    error!(error = %e, "Responder failed");
                    Err(e)
                }
            },
        }
    }
}

fn flatten(joined: std::result::Result<Result<RoleReport>, JoinError>) -> Result<RoleReport> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Responder task did not complete");
            Err(Error::ResponderAborted(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lockstep_net::Connection;

    #[tokio::test]
    async fn test_full_session_three_rounds() {
        let orchestrator = Orchestrator::new(SessionConfig::loopback(3));
        assert_eq!(orchestrator.config().rounds, 3);

        let report = tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
            .await
            .expect("session hung")
            .unwrap();

        assert_eq!(report.initiator.rounds, 3);
        assert_eq!(report.initiator.sent(), vec!["PING"; 3]);
        assert_eq!(report.initiator.received(), vec!["PONG"; 3]);
        assert!(report.initiator.alternates());

        assert_eq!(report.responder.rounds, 3);
        assert_eq!(report.responder.received(), vec!["PING"; 3]);
        assert_eq!(report.responder.sent(), vec!["PONG"; 3]);
        assert!(report.responder.alternates());
    }

    #[tokio::test]
    async fn test_single_round_with_delays() {
        let mut config = SessionConfig::loopback(1);
        config.work_delay = Duration::from_millis(20);
        config.dial_delay = Duration::from_millis(20);

        let report = Orchestrator::new(config).run().await.unwrap();
        assert_eq!(report.initiator.rounds, 1);
        assert_eq!(report.responder.rounds, 1);
    }

    #[tokio::test]
    async fn test_unreachable_dial_is_reported() {
        // Endpoint on 127.0.0.1, responder dials another loopback address
        let mut config = SessionConfig::loopback(2);
        config.dial_ip = "127.0.0.2".parse().unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), Orchestrator::new(config).run())
            .await
            .expect("orchestrator hung in accept");

        assert!(matches!(
            result,
            Err(Error::Net(lockstep_net::Error::Connect { .. }))
        ));
    }

    #[tokio::test]
    async fn test_closed_endpoint_is_reported() {
        let mut config = SessionConfig::loopback(1);
        config.dial_delay = Duration::from_secs(30);
        let orchestrator = Orchestrator::new(config);

        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        listener.closer().close();

        let result = orchestrator.run_with(listener).await;
        assert!(matches!(
            result,
            Err(Error::Net(lockstep_net::Error::Accept(_)))
        ));
    }

    #[tokio::test]
    async fn test_port_in_use_is_reported() {
        let holder = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let mut config = SessionConfig::loopback(1);
        config.port = holder.local_addr().port();

        let result = Orchestrator::new(config).run().await;
        assert!(matches!(
            result,
            Err(Error::Net(lockstep_net::Error::Bind { .. }))
        ));
    }

    #[tokio::test]
    async fn test_stranger_connection_ends_session() {
        // A peer that is not a responder connects first and leaves immediately
        let mut config = SessionConfig::loopback(2);
        config.dial_delay = Duration::from_millis(500);
        let orchestrator = Orchestrator::new(config);

        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr();
        let stranger = tokio::spawn(async move {
            let conn = Connection::connect(addr).await.unwrap();
            drop(conn);
        });

        let result = tokio::time::timeout(Duration::from_secs(10), orchestrator.run_with(listener))
            .await
            .expect("session hung");
        stranger.await.unwrap();

        // EOF or reset, depending on timing
        assert!(matches!(
            result,
            Err(Error::Net(lockstep_net::Error::Transport(_)))
        ));
    }
}
