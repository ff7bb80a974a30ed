//! Lockstep Core Library
//!
//! Two roles that take turns over one TCP link, and the orchestrator that
//! wires them together. The roles share no state: each round's ordering
//! follows from blocking receives on an in-order stream.

pub mod config;
pub mod error;
pub mod initiator;
pub mod orchestrator;
pub mod report;
pub mod responder;

use std::time::Duration;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use initiator::{Initiator, InitiatorState};
pub use orchestrator::Orchestrator;
pub use report::{Exchange, Role, RoleReport, SessionReport};
pub use responder::{Responder, ResponderState};

/// Stand-in for the per-round work each role performs
pub(crate) async fn simulate_work(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
