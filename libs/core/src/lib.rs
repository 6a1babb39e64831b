//! Rendezvous Core - Shared configuration for the paired byte pipe
//!
//! Holds the [`PipeConfig`] consumed by `rendezvous-pipe` and the error
//! type returned while loading it.

pub mod config;
pub mod error;

pub use config::{PipeConfig, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use error::{Error, Result};
