//! The open/read/write/close contract and its serialized variant
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Endpoint (trait)            │
//! └──────────────────────────────┘
//!      ▲                  ▲
//!      │                  │
//! BufferStore        SharedStore
//! (no locking,       (Arc<Mutex<BufferStore>>,
//!  &mut access)       one lock per operation)
//! ```

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

use crate::error::TransferFault;
use crate::store::{BufferStore, ReadOutcome};
use crate::transfer::{TransferSink, TransferSource};

/// Operations a host dispatches into a store
pub trait Endpoint {
    /// Count an open, returning the new open count
    fn open(&mut self) -> usize;

    /// See [`BufferStore::read`]
    ///
    /// # Errors
    /// The destination rejected the delivery.
    fn read<S: TransferSink + ?Sized>(
        &mut self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault>;

    /// See [`BufferStore::write`]
    ///
    /// # Errors
    /// The source could not provide the requested bytes.
    fn write<S: TransferSource + ?Sized>(
        &mut self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault>;

    fn close(&mut self);
}

impl Endpoint for BufferStore {
    fn open(&mut self) -> usize {
        BufferStore::open(self)
    }

    fn read<S: TransferSink + ?Sized>(
        &mut self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault> {
        BufferStore::read(self, offset, length, sink)
    }

    fn write<S: TransferSource + ?Sized>(
        &mut self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault> {
        BufferStore::write(self, length, source)
    }

    fn close(&mut self) {
        BufferStore::close(self);
    }
}

/// Serialized store: a single mutex guards all four operations
///
/// This is a deliberate departure from the unlocked core. Clones share
/// the same store and may be moved across threads.
///
/// # Thread Safety
///
/// Each operation takes the lock once, runs the core operation, and
/// releases it. The lock is not reentrant: calling back into the same
/// store from inside a transfer channel would deadlock.
#[derive(Clone)]
pub struct SharedStore(Arc<Mutex<BufferStore>>);

impl SharedStore {
    #[must_use]
    pub fn new(store: BufferStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn open(&self) -> usize {
        self.0.lock().open()
    }

    /// # Errors
    /// The destination rejected the delivery.
    pub fn read<S: TransferSink + ?Sized>(
        &self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault> {
        self.0.lock().read(offset, length, sink)
    }

    /// # Errors
    /// The source could not provide the requested bytes.
    pub fn write<S: TransferSource + ?Sized>(
        &self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault> {
        self.0.lock().write(length, source)
    }

    pub fn close(&self) {
        self.0.lock().close();
    }

    /// Lock the store for inspection
    ///
    /// The lock is held until the guard is dropped.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, BufferStore> {
        self.0.lock()
    }
}

impl Endpoint for SharedStore {
    fn open(&mut self) -> usize {
        SharedStore::open(self)
    }

    fn read<S: TransferSink + ?Sized>(
        &mut self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault> {
        SharedStore::read(self, offset, length, sink)
    }

    fn write<S: TransferSource + ?Sized>(
        &mut self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault> {
        SharedStore::write(self, length, source)
    }

    fn close(&mut self) {
        SharedStore::close(self);
    }
}

impl From<BufferStore> for SharedStore {
    fn from(store: BufferStore) -> Self {
        Self::new(store)
    }
}

impl fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedStore({:?})", *self.0.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn exercise<E: Endpoint>(endpoint: &mut E) -> Vec<u8> {
        endpoint.open();
        endpoint.write(6, &b"shared"[..]).unwrap();
        let mut out = Vec::new();
        endpoint.read(0, 1024, &mut out).unwrap();
        endpoint.close();
        out
    }

    #[test]
    fn test_both_variants_behave_alike() {
        let mut raw = BufferStore::new().unwrap();
        let mut shared = SharedStore::new(BufferStore::new().unwrap());

        assert_eq!(exercise(&mut raw), b"shared");
        assert_eq!(exercise(&mut shared), b"shared");
        assert_eq!(raw.open_count(), shared.lock().open_count());
    }

    #[test]
    fn test_clone_shares_store() {
        let a = SharedStore::new(BufferStore::new().unwrap());
        let b = a.clone();

        a.write(3, &b"abc"[..]).unwrap();
        assert_eq!(b.lock().payload(), b"abc");
    }

    #[test]
    fn test_opens_counted_across_threads() {
        let shared = SharedStore::new(BufferStore::new().unwrap());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let store = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        store.open();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(shared.lock().open_count(), 100);
    }
}
