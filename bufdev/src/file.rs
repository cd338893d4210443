//! Caller session on an activated device
//!
//! The store keeps no per-caller position. [`DeviceFile`] holds one and
//! threads it through successive reads, the way a host threads a file
//! position through read calls.

use std::fmt;
use std::sync::Arc;

use embedded_io::ErrorType;

use crate::error::DeviceError;
use crate::idgen::DeviceHandle;
use crate::registry::Registration;
use crate::store::ReadOutcome;

/// An open device, as seen by one caller
///
/// # Write semantics
///
/// Every `write` replaces the device payload starting at offset 0 and is
/// clamped to the store capacity minus one. The read position is not
/// touched by a write; call [`DeviceFile::rewind`] to read the new payload
/// from the start. `write_all` with more data than fits therefore keeps
/// only the final chunk.
pub struct DeviceFile<R: Registration> {
    registry: Arc<R>,
    handle: DeviceHandle,
    pos: usize,
    closed: bool,
}

impl<R: Registration> DeviceFile<R> {
    /// Dispatch an open and start a session at position 0
    ///
    /// # Errors
    /// Unknown handle.
    pub fn open(registry: Arc<R>, handle: DeviceHandle) -> Result<Self, DeviceError> {
        registry.dispatch_open(handle)?;
        Ok(Self {
            registry,
            handle,
            pos: 0,
            closed: false,
        })
    }

    #[must_use]
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Bytes of the current payload this session has consumed
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read from the current position
    ///
    /// Returns 0 at end of data. On a fault the position stays put.
    ///
    /// # Errors
    /// Closed session, unknown device, or a transfer fault.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        match self
            .registry
            .dispatch_read(self.handle, self.pos, buf.len(), buf)?
        {
            ReadOutcome::Delivered { bytes, new_offset } => {
                self.pos = new_offset;
                Ok(bytes)
            }
            ReadOutcome::EndOfData => Ok(0),
        }
    }

    /// Replace the payload with `buf`, returning the number of bytes kept
    ///
    /// # Errors
    /// Closed session, unknown device, or a transfer fault.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        self.registry.dispatch_write(self.handle, buf.len(), buf)
    }

    /// Dispatch a close. Can be called multiple times; drop calls it too.
    ///
    /// # Errors
    /// The device was deactivated while the session was open.
    pub fn close(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            log::warn!("DeviceFile::close() called on already closed file: {self:?}");
            return Ok(());
        }
        self.closed = true;
        self.registry.dispatch_close(self.handle)?;
        Ok(())
    }
}

impl<R: Registration> fmt::Debug for DeviceFile<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeviceFile(handle={:?}, pos={}, closed={})",
            self.handle, self.pos, self.closed
        )
    }
}

impl<R: Registration> Drop for DeviceFile<R> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

impl<R: Registration> ErrorType for DeviceFile<R> {
    type Error = DeviceError;
}

impl<R: Registration> embedded_io::Read for DeviceFile<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        DeviceFile::read(self, buf)
    }
}

impl<R: Registration> embedded_io::Write for DeviceFile<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        DeviceFile::write(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<R: Registration> embedded_io_async::Read for DeviceFile<R> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        DeviceFile::read(self, buf)
    }
}

impl<R: Registration> embedded_io_async::Write for DeviceFile<R> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        DeviceFile::write(self, buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
