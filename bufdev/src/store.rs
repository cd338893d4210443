//! Fixed-capacity byte store behind the open/read/write/close contract
//!
//! [`BufferStore`] is the unsynchronized core: it has no internal locking
//! and every operation takes `&mut self`. Wrap it in
//! [`SharedStore`](crate::endpoint::SharedStore) to share it between
//! threads.

use std::fmt;

use crate::error::{StoreError, TransferFault};
use crate::event::{Event, EventKind, EventSink, LogSink};
use crate::transfer::{TransferSink, TransferSource};

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_PAYLOAD: &str = "Hello from kernel space!";

const TERMINATOR: u8 = 0;

/// Result of a successful read call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `bytes` were delivered; the caller continues at `new_offset`
    Delivered { bytes: usize, new_offset: usize },
    /// The offset is at or past the logical length
    EndOfData,
}

impl ReadOutcome {
    /// Number of bytes delivered, 0 at end of data
    #[must_use]
    pub fn bytes(&self) -> usize {
        match self {
            Self::Delivered { bytes, .. } => *bytes,
            Self::EndOfData => 0,
        }
    }

    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData)
    }
}

/// Fixed-capacity byte buffer with a logical length and an open counter
///
/// The logical length never exceeds `capacity - 1`: one byte always stays
/// free for the terminator written after the payload.
///
/// # Example
///
/// ```
/// use bufdev::{BufferStore, ReadOutcome};
///
/// let mut store = BufferStore::new().unwrap();
/// store.write(5, &b"howdy"[..]).unwrap();
///
/// let mut out = Vec::new();
/// let outcome = store.read(0, 1024, &mut out).unwrap();
/// assert_eq!(outcome, ReadOutcome::Delivered { bytes: 5, new_offset: 5 });
/// assert_eq!(out, b"howdy");
/// ```
pub struct BufferStore {
    content: Box<[u8]>,
    // Writes land here first so a failed source never touches `content`
    staging: Box<[u8]>,
    len: usize,
    open_count: usize,
    sink: Box<dyn EventSink>,
}

impl BufferStore {
    /// Store with the default capacity holding the default greeting
    ///
    /// # Errors
    /// Fails if the buffer cannot be allocated.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_payload(DEFAULT_CAPACITY, DEFAULT_PAYLOAD.as_bytes())
    }

    /// Allocate a store and load the initial payload
    ///
    /// The payload is clamped to `capacity - 1` bytes, the same way a
    /// write is.
    ///
    /// # Errors
    /// - `capacity` is zero
    /// - the allocation fails
    pub fn with_payload(capacity: usize, payload: &[u8]) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        let mut content = alloc_zeroed(capacity)?;
        let staging = alloc_zeroed(capacity - 1)?;

        let len = payload.len().min(capacity - 1);
        content[..len].copy_from_slice(&payload[..len]);
        content[len] = TERMINATOR;

        Ok(Self {
            content,
            staging,
            len,
            open_count: 0,
            sink: Box::new(LogSink::default()),
        })
    }

    /// Replace the event sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.content.len()
    }

    /// Logical length: the number of readable payload bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// The currently readable payload
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.content[..self.len]
    }

    /// Count an open. Never fails; returns the new open count.
    pub fn open(&mut self) -> usize {
        self.open_count = self.open_count.wrapping_add(1);
        self.emit(EventKind::Opened, self.open_count);
        self.open_count
    }

    /// Deliver payload bytes starting at `offset`
    ///
    /// At most `min(length, len() - offset)` bytes are delivered. The
    /// caller owns the offset: on success it continues at
    /// `new_offset`; on a fault the offset must stay where it was.
    ///
    /// # Errors
    /// Returns the sink's [`TransferFault`] if the destination rejects
    /// the delivery.
    pub fn read<S: TransferSink + ?Sized>(
        &mut self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault> {
        if offset >= self.len {
            self.emit(EventKind::EndOfData, 0);
            return Ok(ReadOutcome::EndOfData);
        }

        let bytes = length.min(self.len - offset);
        let new_offset = offset + bytes;
        if let Err(fault) = sink.accept(&self.content[offset..new_offset]) {
            self.emit(EventKind::SendFailed, fault.not_copied);
            return Err(fault);
        }

        self.emit(EventKind::Sent, bytes);
        Ok(ReadOutcome::Delivered { bytes, new_offset })
    }

    /// Replace the payload with up to `length` bytes from `source`
    ///
    /// The request is clamped to `capacity - 1` bytes and always lands at
    /// offset 0; there is no write cursor. Content and logical length
    /// change only after the whole copy succeeded.
    ///
    /// # Errors
    /// Returns the source's [`TransferFault`]; the store is unchanged.
    pub fn write<S: TransferSource + ?Sized>(
        &mut self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault> {
        let accepted = length.min(self.capacity() - 1);

        if let Err(fault) = source.provide(&mut self.staging[..accepted]) {
            self.emit(EventKind::ReceiveFailed, fault.not_copied);
            return Err(fault);
        }

        self.content[..accepted].copy_from_slice(&self.staging[..accepted]);
        self.content[accepted] = TERMINATOR;
        self.len = accepted;

        self.emit(EventKind::Received, accepted);
        Ok(accepted)
    }

    /// Release a caller. Only reports the event.
    pub fn close(&mut self) {
        self.emit(EventKind::Closed, 0);
    }

    fn emit(&mut self, kind: EventKind, count: usize) {
        self.sink.emit(Event::new(kind, count));
    }
}

impl fmt::Debug for BufferStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BufferStore(capacity={}, len={}, opens={})",
            self.capacity(),
            self.len,
            self.open_count
        )
    }
}

fn alloc_zeroed(size: usize) -> Result<Box<[u8]>, StoreError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| StoreError::Alloc(size))?;
    buf.resize(size, 0);
    Ok(buf.into_boxed_slice())
}
