use crate::copy::ByteCopy;
use crate::error::{Error, Result};

/// In-process copy between two slices of equal length
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCopy;

impl PlainCopy {
    fn copy(dst: &mut [u8], src: &[u8]) -> Result<()> {
        if dst.len() != src.len() {
            return Err(Error::TransferFault(format!(
                "length mismatch: {} byte destination, {} byte source",
                dst.len(),
                src.len()
            )));
        }
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl ByteCopy for PlainCopy {
    fn copy_in(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        Self::copy(dst, src)
    }

    fn copy_out(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        Self::copy(dst, src)
    }
}
