use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Broadcast condition variable for state guarded by a `parking_lot::Mutex`
///
/// Every wake-up reaches all current waiters, which then re-check their own
/// predicate. A waiter calls [`Condition::notified`] while still holding the
/// lock, releases the lock, and only then awaits [`Condition::sleep`], so no
/// guard is ever held across a suspension point and no broadcast issued by
/// the next lock holder is missed.
#[derive(Debug, Default)]
pub(crate) struct Condition {
    notify: Notify,
}

/// How a [`Condition::sleep`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    Notified,
    Cancelled,
}

impl Condition {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wake every task sleeping on this condition
    pub(crate) fn broadcast(&self) {
        self.notify.notify_waiters();
    }

    /// Register for the next broadcast; call with the lock held
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    /// Sleep until `notified` fires or `cancel` is triggered
    ///
    /// An already-cancelled token wins immediately.
    pub(crate) async fn sleep(notified: Notified<'_>, cancel: &CancellationToken) -> Wake {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Wake::Cancelled,
            _ = notified => Wake::Notified,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    #[tokio::test]
    async fn broadcast_wakes_waiter_after_predicate_change() {
        let lock = Arc::new(Mutex::new(false));
        let cond = Arc::new(Condition::new());

        let waiter = {
            let lock = lock.clone();
            let cond = cond.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                loop {
                    let notified = {
                        let ready = lock.lock();
                        if *ready {
                            return true;
                        }
                        cond.notified()
                    };
                    if Condition::sleep(notified, &cancel).await == Wake::Cancelled {
                        return false;
                    }
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        *lock.lock() = true;
        cond.broadcast();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_token_interrupts_immediately() {
        let cond = Condition::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let wake = tokio::time::timeout(
            Duration::from_secs(1),
            Condition::sleep(cond.notified(), &cancel),
        )
        .await
        .unwrap();
        assert_eq!(wake, Wake::Cancelled);
    }
}
