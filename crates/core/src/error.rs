//! Error types for Lockstep Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Net(#[from] lockstep_net::Error),

    #[error("Responder aborted: {0}")]
    ResponderAborted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
