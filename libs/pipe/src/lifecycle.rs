use std::sync::atomic::{AtomicU64, Ordering};

/// Allocation and release counters shared by a coordinator and its channels
///
/// A channel is counted as allocated when a writer pairs with a reader and
/// as released when the second endpoint closes.
#[derive(Debug, Default)]
pub struct LifecycleStats {
    allocated: AtomicU64,
    released: AtomicU64,
}

/// Point-in-time copy of [`LifecycleStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleSnapshot {
    pub allocated: u64,
    pub released: u64,
}

impl LifecycleSnapshot {
    /// Channels allocated and not yet released
    pub fn live(&self) -> u64 {
        self.allocated.saturating_sub(self.released)
    }
}

impl LifecycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allocation(&self) {
        self.allocated.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_release(&self) {
        self.released.fetch_add(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        // Every release follows its allocation, so reading `released` first
        // keeps `released <= allocated` in the snapshot.
        let released = self.released.load(Ordering::Acquire);
        let allocated = self.allocated.load(Ordering::Acquire);
        LifecycleSnapshot {
            allocated,
            released,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn live_never_underflows() {
        let skewed = LifecycleSnapshot {
            allocated: 1,
            released: 2,
        };
        assert_eq!(skewed.live(), 0);
    }

    #[test]
    fn concurrent_snapshots_never_show_more_releases_than_allocations() {
        let stats = Arc::new(LifecycleStats::new());
        let churn = {
            let stats = stats.clone();
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    stats.record_allocation();
                    stats.record_release();
                }
            })
        };

        for _ in 0..10_000 {
            let snapshot = stats.snapshot();
            assert!(snapshot.released <= snapshot.allocated);
        }
        churn.join().unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.allocated, 10_000);
        assert_eq!(snapshot.live(), 0);
    }
}
