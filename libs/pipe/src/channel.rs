use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::condition::{Condition, Wake};
use crate::copy::ByteCopy;
use crate::error::{Error, Result};
use crate::lifecycle::LifecycleStats;

/// Which side of a channel an endpoint drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Writer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => f.write_str("reader"),
            Role::Writer => f.write_str("writer"),
        }
    }
}

/// Open state of one role
///
/// `Pending` only applies to the reader, between pairing and the return of
/// its open call. It does not count as closed for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Pending,
    Open,
    Closed,
}

/// Result of closing one role of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The other role is still open; the channel lives on
    Retained,
    /// Both roles are closed and the ring has been released
    Released,
}

struct ChannelState {
    ring: Option<Box<[u8]>>,
    /// Write cursor; the read cursor trails it by `size`
    head: usize,
    size: usize,
    reader: EndpointState,
    writer: EndpointState,
}

/// Bounded single-reader, single-writer byte stream created by a pairing
///
/// The ring is released by whichever [`Channel::close`] call observes both
/// roles closed.
pub struct Channel {
    id: u64,
    capacity: usize,
    state: Mutex<ChannelState>,
    cond: Condition,
    copier: Arc<dyn ByteCopy>,
    stats: Arc<LifecycleStats>,
}

impl Channel {
    /// Allocate a channel for a freshly paired writer and reader
    pub(crate) fn allocate(
        id: u64,
        capacity: usize,
        copier: Arc<dyn ByteCopy>,
        stats: Arc<LifecycleStats>,
    ) -> Result<Self> {
        let mut ring = Vec::new();
        ring.try_reserve_exact(capacity)
            .map_err(|e| Error::Allocation(e.to_string()))?;
        ring.resize(capacity, 0u8);

        stats.record_allocation();
        debug!(channel = id, capacity, "channel allocated");

        Ok(Self {
            id,
            capacity,
            state: Mutex::new(ChannelState {
                ring: Some(ring.into_boxed_slice()),
                head: 0,
                size: 0,
                reader: EndpointState::Pending,
                writer: EndpointState::Open,
            }),
            cond: Condition::new(),
            copier,
            stats,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.state.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both roles have closed and the ring is gone
    pub fn is_released(&self) -> bool {
        self.state.lock().ring.is_none()
    }

    pub fn endpoint_state(&self, role: Role) -> EndpointState {
        let state = self.state.lock();
        match role {
            Role::Reader => state.reader,
            Role::Writer => state.writer,
        }
    }

    /// Move the reader from `Pending` to `Open` once its open call completes
    pub(crate) fn mark_reader_open(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.reader != EndpointState::Pending {
            return Err(Error::Closed);
        }
        state.reader = EndpointState::Open;
        Ok(())
    }

    /// Read up to `dst.len()` bytes
    ///
    /// Blocks while the ring is empty and the writer is open. Returns `0` at
    /// end of stream (writer closed, ring drained).
    pub async fn read(&self, dst: &mut [u8], cancel: &CancellationToken) -> Result<usize> {
        trace!(channel = self.id, requested = dst.len(), "read request");

        let mut state = self.state.lock();
        if state.ring.is_none() || state.reader == EndpointState::Closed {
            return Err(Error::Closed);
        }

        while state.size == 0 && state.writer == EndpointState::Open {
            let notified = self.cond.notified();
            drop(state);
            let wake = Condition::sleep(notified, cancel).await;
            state = self.state.lock();
            if wake == Wake::Cancelled {
                self.cond.broadcast();
                drop(state);
                debug!(channel = self.id, "read cancelled");
                return Err(Error::Cancelled);
            }
        }

        let capacity = self.capacity;
        let ChannelState {
            ring, head, size, ..
        } = &mut *state;
        let Some(ring) = ring.as_deref() else {
            return Err(Error::Closed);
        };

        let count = dst.len().min(*size);
        let mut out = (*head + capacity - *size) % capacity;
        for k in 0..count {
            if let Err(err) = self.copier.copy_out(&mut dst[k..=k], &ring[out..=out]) {
                self.cond.broadcast();
                warn!(channel = self.id, copied = k, error = %err, "read aborted");
                return Err(err);
            }
            out = (out + 1) % capacity;
            *size -= 1;
        }

        self.cond.broadcast();
        trace!(channel = self.id, count, "read complete");
        Ok(count)
    }

    /// Write all of `src`, blocking whenever the ring is full
    pub async fn write(&self, src: &[u8], cancel: &CancellationToken) -> Result<usize> {
        trace!(channel = self.id, requested = src.len(), "write request");

        let mut state = self.state.lock();
        if state.ring.is_none() || state.writer == EndpointState::Closed {
            return Err(Error::Closed);
        }

        for k in 0..src.len() {
            while state.size == self.capacity {
                self.cond.broadcast();
                let notified = self.cond.notified();
                drop(state);
                let wake = Condition::sleep(notified, cancel).await;
                state = self.state.lock();
                if wake == Wake::Cancelled {
                    self.cond.broadcast();
                    drop(state);
                    debug!(channel = self.id, written = k, "write cancelled");
                    return Err(Error::Cancelled);
                }
            }

            let ChannelState {
                ring, head, size, ..
            } = &mut *state;
            let Some(ring) = ring.as_deref_mut() else {
                return Err(Error::Closed);
            };

            if let Err(err) = self.copier.copy_in(&mut ring[*head..=*head], &src[k..=k]) {
                self.cond.broadcast();
                warn!(channel = self.id, copied = k, error = %err, "write aborted");
                return Err(err);
            }
            *head = (*head + 1) % self.capacity;
            *size += 1;
        }

        self.cond.broadcast();
        trace!(channel = self.id, count = src.len(), "write complete");
        Ok(src.len())
    }

    /// Close one role; the call that closes the second role releases the ring
    pub fn close(&self, role: Role) -> Result<CloseOutcome> {
        let mut state = self.state.lock();

        let slot = match role {
            Role::Reader => &mut state.reader,
            Role::Writer => &mut state.writer,
        };
        if *slot == EndpointState::Closed {
            return Err(Error::Closed);
        }
        *slot = EndpointState::Closed;

        if state.reader == EndpointState::Closed && state.writer == EndpointState::Closed {
            let discarded = state.size;
            let ring = state.ring.take();
            state.size = 0;
            state.head = 0;
            drop(state);
            drop(ring);

            self.stats.record_release();
            debug!(channel = self.id, %role, discarded, "channel released");
            Ok(CloseOutcome::Released)
        } else {
            self.cond.broadcast();
            drop(state);
            debug!(channel = self.id, %role, "endpoint closed");
            Ok(CloseOutcome::Retained)
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
