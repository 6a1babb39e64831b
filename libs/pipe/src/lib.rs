//! Rendezvous Pipe - Paired single-reader, single-writer byte channel
//!
//! A reader and a writer must meet through a [`Coordinator`] before any byte
//! flows. The writer that claims the waiting reader creates a [`Channel`], a
//! small bounded ring with blocking flow control, which is released when
//! both ends have closed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rendezvous_core::PipeConfig;
//! use rendezvous_pipe::{transfer, Coordinator, Device};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let device = Device::new(Arc::new(Coordinator::in_process(PipeConfig::default())?));
//! let cancel = CancellationToken::new();
//!
//! let reader = {
//!     let device = device.clone();
//!     let cancel = cancel.clone();
//!     tokio::spawn(async move { transfer::receive(&device, &cancel).await })
//! };
//! transfer::send(&device, b"HELLO", &cancel).await?;
//! assert_eq!(reader.await??, b"HELLO");
//! # Ok(())
//! # }
//! ```

pub mod channel;
mod condition;
pub mod coordinator;
pub mod copy;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod transfer;

// Re-exports for convenience
pub use channel::{Channel, CloseOutcome, EndpointState, Role};
pub use coordinator::Coordinator;
pub use copy::{BudgetCopy, ByteCopy, PlainCopy};
pub use endpoint::{Device, Endpoint, OpenMode};
pub use error::{Error, Result};
pub use lifecycle::{LifecycleSnapshot, LifecycleStats};
