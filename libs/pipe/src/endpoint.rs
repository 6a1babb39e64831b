use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::channel::{Channel, CloseOutcome, Role};
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};

/// Direction requested when opening the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

impl From<OpenMode> for Role {
    fn from(mode: OpenMode) -> Self {
        match mode {
            OpenMode::Read => Role::Reader,
            OpenMode::Write => Role::Writer,
        }
    }
}

/// Open/read/write/close surface over a shared [`Coordinator`]
///
/// Cheap to clone; every clone pairs through the same coordinator.
#[derive(Clone)]
pub struct Device {
    coordinator: Arc<Coordinator>,
}

impl Device {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Open one end of a new pipe, waiting until the other end shows up
    pub async fn open(&self, mode: OpenMode, cancel: &CancellationToken) -> Result<Endpoint> {
        debug!(?mode, "open request");
        let channel = match mode {
            OpenMode::Read => {
                let channel = self.coordinator.register_reader(cancel).await?;
                channel.mark_reader_open()?;
                channel
            }
            OpenMode::Write => self.coordinator.acquire_pending_reader(cancel).await?,
        };
        debug!(?mode, channel = channel.id(), "open successful");

        Ok(Endpoint {
            role: mode.into(),
            channel,
            closed: false,
        })
    }
}

/// One opened end of a paired channel
///
/// Dropping an endpoint that was never closed closes its role.
pub struct Endpoint {
    role: Role,
    channel: Arc<Channel>,
    closed: bool,
}

impl Endpoint {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Read buffered bytes; `Ok(0)` means the writer closed and nothing is left
    pub async fn read(&mut self, buf: &mut [u8], cancel: &CancellationToken) -> Result<usize> {
        if self.role != Role::Reader {
            return Err(Error::WrongRole(self.role));
        }
        self.channel.read(buf, cancel).await
    }

    /// Write every byte of `buf`, waiting for the reader to free space as needed
    pub async fn write(&mut self, buf: &[u8], cancel: &CancellationToken) -> Result<usize> {
        if self.role != Role::Writer {
            return Err(Error::WrongRole(self.role));
        }
        self.channel.write(buf, cancel).await
    }

    /// Close this end of the channel
    pub fn close(mut self) -> Result<CloseOutcome> {
        self.closed = true;
        self.channel.close(self.role)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if !self.closed {
            let outcome = self.channel.close(self.role);
            debug!(
                channel = self.channel.id(),
                role = %self.role,
                ?outcome,
                "endpoint dropped"
            );
        }
    }
}
