//! Lockstep - TCP ping-pong between two independent tasks
//!
//! The initiator accepts one peer on the session port and the responder dials
//! it; they then alternate trigger and acknowledgment for a fixed number of
//! rounds.

use std::process::ExitCode;

use lockstep_core::{Orchestrator, SessionConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Fatal error: failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("=== TCP Ping-Pong ===");

    let orchestrator = Orchestrator::new(SessionConfig::default());
    let config = orchestrator.config();
    tracing::info!(port = config.port, rounds = config.rounds, "Session configured");

    match runtime.block_on(orchestrator.run()) {
        Ok(report) => {
            tracing::info!(
                initiator_rounds = report.initiator.rounds,
                responder_rounds = report.responder.rounds,
                "=== Done ==="
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}
