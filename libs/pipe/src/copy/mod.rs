use crate::error::Result;

pub mod budget;
pub mod plain;

pub use self::budget::BudgetCopy;
pub use self::plain::PlainCopy;

/// Primitive that moves bytes between a channel's ring and a caller buffer
///
/// Channels call it once per transferred byte. A failure aborts the
/// transfer in progress with [`Error::TransferFault`](crate::Error::TransferFault).
pub trait ByteCopy: Send + Sync {
    /// Copy caller bytes (`src`) into the ring (`dst`)
    fn copy_in(&self, dst: &mut [u8], src: &[u8]) -> Result<()>;

    /// Copy ring bytes (`src`) out to the caller (`dst`)
    fn copy_out(&self, dst: &mut [u8], src: &[u8]) -> Result<()>;
}
