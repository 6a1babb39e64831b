use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rendezvous_core::PipeConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::channel::{Channel, Role};
use crate::condition::{Condition, Wake};
use crate::copy::{ByteCopy, PlainCopy};
use crate::error::{Error, Result};
use crate::lifecycle::LifecycleStats;

/// Identifies one pending reader record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ReaderTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Waiting,
    Ready,
}

struct PendingReader {
    status: Status,
    channel: Option<Arc<Channel>>,
}

#[derive(Default)]
struct Pairing {
    /// The single reader currently offered to writers
    slot: Option<ReaderTicket>,
    /// Records of readers that have published themselves and not yet returned
    records: HashMap<ReaderTicket, PendingReader>,
    next_ticket: u64,
    next_channel: u64,
}

impl Pairing {
    /// Take the channel handed to `ticket` if a writer has paired with it
    fn claim_ready(&mut self, ticket: ReaderTicket) -> Option<Arc<Channel>> {
        let ready = self
            .records
            .get(&ticket)
            .is_some_and(|record| record.status == Status::Ready);
        if !ready {
            return None;
        }
        self.records.remove(&ticket).and_then(|record| record.channel)
    }
}

/// A reader record published in the pairing state
///
/// Dropping it while armed withdraws the record, so a reader whose open is
/// abandoned (cancelled, timed out, or dropped) never strands a writer.
struct PublishedReader<'a> {
    coordinator: &'a Coordinator,
    ticket: ReaderTicket,
    armed: bool,
}

impl PublishedReader<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PublishedReader<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.withdraw(self.ticket);
        }
    }
}

/// Matches opening readers with opening writers
///
/// At most one reader waits to be paired at a time; further readers queue
/// behind it. A writer claims the waiting reader and creates the
/// [`Channel`] both of them use.
pub struct Coordinator {
    config: PipeConfig,
    copier: Arc<dyn ByteCopy>,
    stats: Arc<LifecycleStats>,
    pairing: Mutex<Pairing>,
    cond: Condition,
}

impl Coordinator {
    /// Create a coordinator whose channels copy bytes with `copier`
    pub fn new(config: PipeConfig, copier: Arc<dyn ByteCopy>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            copier,
            stats: Arc::new(LifecycleStats::new()),
            pairing: Mutex::new(Pairing::default()),
            cond: Condition::new(),
        })
    }

    /// Coordinator for in-process callers using plain slice copies
    pub fn in_process(config: PipeConfig) -> Result<Self> {
        Self::new(config, Arc::new(PlainCopy))
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<LifecycleStats> {
        &self.stats
    }

    /// Whether a reader is currently waiting for a writer
    pub fn has_pending_reader(&self) -> bool {
        self.pairing.lock().slot.is_some()
    }

    /// Publish a reader and wait until a writer pairs with it
    ///
    /// Waits first for the pending slot to free up, then for a writer to
    /// mark this reader's record ready. The returned channel still has its
    /// reader role `Pending`. If the call is cancelled or its future is
    /// dropped before it returns, the reader's record is withdrawn; a
    /// channel a writer already created for it gets its reader role closed.
    pub async fn register_reader(&self, cancel: &CancellationToken) -> Result<Arc<Channel>> {
        let ticket = loop {
            let notified = {
                let mut pairing = self.pairing.lock();
                if pairing.slot.is_none() {
                    let ticket = ReaderTicket(pairing.next_ticket);
                    pairing.next_ticket += 1;
                    pairing.records.insert(
                        ticket,
                        PendingReader {
                            status: Status::Waiting,
                            channel: None,
                        },
                    );
                    pairing.slot = Some(ticket);
                    self.cond.broadcast();
                    break ticket;
                }
                self.cond.notified()
            };
            if Condition::sleep(notified, cancel).await == Wake::Cancelled {
                self.cond.broadcast();
                debug!("reader cancelled while queued for the pending slot");
                return Err(Error::Cancelled);
            }
        };

        let mut published = PublishedReader {
            coordinator: self,
            ticket,
            armed: true,
        };
        debug!(ticket = ticket.0, "reader waiting for a writer");

        let channel = loop {
            let notified = {
                let mut pairing = self.pairing.lock();
                if let Some(channel) = pairing.claim_ready(ticket) {
                    self.cond.broadcast();
                    break channel;
                }
                self.cond.notified()
            };
            if Condition::sleep(notified, cancel).await == Wake::Cancelled {
                let mut pairing = self.pairing.lock();
                if let Some(channel) = pairing.claim_ready(ticket) {
                    // A writer paired with us in the same window; finish the open.
                    self.cond.broadcast();
                    break channel;
                }
                drop(pairing);
                debug!(ticket = ticket.0, "reader cancelled before pairing");
                return Err(Error::Cancelled);
            }
        };
        published.disarm();

        debug!(ticket = ticket.0, channel = channel.id(), "reader paired");
        Ok(channel)
    }

    /// Claim the waiting reader and create the channel the pair will share
    ///
    /// Waits while no reader is pending. If the channel cannot be allocated
    /// the reader goes back into the slot for the next writer.
    pub async fn acquire_pending_reader(&self, cancel: &CancellationToken) -> Result<Arc<Channel>> {
        loop {
            let notified = {
                let mut pairing = self.pairing.lock();
                if let Some(ticket) = pairing.slot.take() {
                    return self.pair_with(&mut pairing, ticket);
                }
                self.cond.notified()
            };
            if Condition::sleep(notified, cancel).await == Wake::Cancelled {
                self.cond.broadcast();
                debug!("writer cancelled while waiting for a reader");
                return Err(Error::Cancelled);
            }
        }
    }

    fn pair_with(&self, pairing: &mut Pairing, ticket: ReaderTicket) -> Result<Arc<Channel>> {
        let id = pairing.next_channel;
        let channel = match Channel::allocate(
            id,
            self.config.capacity,
            self.copier.clone(),
            self.stats.clone(),
        ) {
            Ok(channel) => Arc::new(channel),
            Err(err) => {
                pairing.slot = Some(ticket);
                self.cond.broadcast();
                warn!(ticket = ticket.0, error = %err, "channel allocation failed");
                return Err(err);
            }
        };
        pairing.next_channel += 1;

        if let Some(record) = pairing.records.get_mut(&ticket) {
            record.channel = Some(channel.clone());
            record.status = Status::Ready;
        }
        self.cond.broadcast();

        debug!(ticket = ticket.0, channel = id, "writer paired");
        Ok(channel)
    }

    /// Remove an abandoned reader's record and free the slot if it still holds it
    fn withdraw(&self, ticket: ReaderTicket) {
        let record = {
            let mut pairing = self.pairing.lock();
            if pairing.slot == Some(ticket) {
                pairing.slot = None;
            }
            let record = pairing.records.remove(&ticket);
            self.cond.broadcast();
            record
        };

        match record.and_then(|record| record.channel) {
            Some(channel) => {
                let outcome = channel.close(Role::Reader);
                debug!(
                    ticket = ticket.0,
                    channel = channel.id(),
                    ?outcome,
                    "paired reader abandoned"
                );
            }
            None => debug!(ticket = ticket.0, "reader withdrawn before pairing"),
        }
    }
}
