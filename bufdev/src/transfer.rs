//! Byte channels between the store and its callers
//!
//! A read delivers into a [`TransferSink`], a write pulls from a
//! [`TransferSource`]. Both either move every requested byte or fail with
//! [`TransferFault`]; a failed transfer leaves the store untouched.

use crate::error::TransferFault;

/// Destination of a read
pub trait TransferSink {
    /// Copy all of `bytes` into the destination, or reject the transfer.
    fn accept(&mut self, bytes: &[u8]) -> Result<(), TransferFault>;
}

/// Source of a write
pub trait TransferSource {
    /// Fill all of `dest` from the source, or reject the transfer.
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault>;
}

/// A slice sink accepts a delivery only if the whole delivery fits.
impl TransferSink for [u8] {
    fn accept(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        let Some(target) = self.get_mut(..bytes.len()) else {
            return Err(TransferFault::new(bytes.len(), bytes.len() - self.len()));
        };
        target.copy_from_slice(bytes);
        Ok(())
    }
}

impl<const N: usize> TransferSink for [u8; N] {
    fn accept(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        self.as_mut_slice().accept(bytes)
    }
}

/// Appends; never rejects.
impl TransferSink for Vec<u8> {
    fn accept(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// A slice source fails when it holds fewer bytes than requested.
impl TransferSource for [u8] {
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault> {
        let Some(src) = self.get(..dest.len()) else {
            return Err(TransferFault::new(dest.len(), dest.len() - self.len()));
        };
        dest.copy_from_slice(src);
        Ok(())
    }
}

impl<const N: usize> TransferSource for [u8; N] {
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault> {
        self.as_slice().provide(dest)
    }
}

impl TransferSource for Vec<u8> {
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault> {
        self.as_slice().provide(dest)
    }
}

impl TransferSource for str {
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault> {
        self.as_bytes().provide(dest)
    }
}
