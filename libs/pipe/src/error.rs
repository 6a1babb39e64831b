use thiserror::Error;

use crate::channel::Role;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Transfer fault: {0}")]
    TransferFault(String),

    #[error("Channel allocation failed: {0}")]
    Allocation(String),

    #[error("Channel closed")]
    Closed,

    #[error("Endpoint opened as {0} cannot perform this operation")]
    WrongRole(Role),

    #[error("Configuration error: {0}")]
    Config(#[from] rendezvous_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
