use std::sync::atomic::{AtomicUsize, Ordering};

use crate::copy::{ByteCopy, PlainCopy};
use crate::error::{Error, Result};

/// Copy that succeeds for a fixed number of bytes, then faults
///
/// The budget is shared by both directions and by every channel using the
/// same instance. Models a foreign buffer window that becomes inaccessible
/// partway through a transfer.
#[derive(Debug)]
pub struct BudgetCopy {
    remaining: AtomicUsize,
}

impl BudgetCopy {
    /// Allow `bytes` bytes to be copied before faulting
    pub fn new(bytes: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(bytes),
        }
    }

    /// Bytes left before the next copy faults
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    fn charge(&self, len: usize) -> Result<()> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                left.checked_sub(len)
            })
            .map(|_| ())
            .map_err(|left| {
                Error::TransferFault(format!("copy budget exhausted ({left} bytes left)"))
            })
    }
}

impl ByteCopy for BudgetCopy {
    fn copy_in(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        self.charge(src.len())?;
        PlainCopy.copy_in(dst, src)
    }

    fn copy_out(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        self.charge(src.len())?;
        PlainCopy.copy_out(dst, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_once_budget_is_spent() {
        let copy = BudgetCopy::new(2);
        let mut dst = [0u8; 1];
        copy.copy_in(&mut dst, b"a").unwrap();
        copy.copy_out(&mut dst, b"b").unwrap();
        assert_eq!(dst, *b"b");
        assert_eq!(copy.remaining(), 0);
        assert!(matches!(
            copy.copy_in(&mut dst, b"c"),
            Err(Error::TransferFault(_))
        ));
        assert_eq!(dst, *b"b");
    }

    #[test]
    fn plain_copy_rejects_mismatched_lengths() {
        let mut dst = [0u8; 2];
        assert!(PlainCopy.copy_out(&mut dst, b"abc").is_err());
        PlainCopy.copy_out(&mut dst, b"ab").unwrap();
        assert_eq!(&dst, b"ab");
    }
}
