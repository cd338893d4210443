//! Mocked transfer channels and a recording event sink.
//!
//! - `RecordingSink` keeps every event for later inspection.
//! - `FaultySink` takes at most `limit` bytes and rejects larger deliveries.
//! - `FaultySource` rejects a transfer that would cross a `WANT_FAULT` byte.
//!
//! `WANT_FAULT` plays the role of an unmapped page: the source can hand
//! out every byte before it, but not the marker itself.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::TransferFault;
use crate::event::{Event, EventKind, EventSink};
use crate::transfer::{TransferSink, TransferSource};

pub const WANT_FAULT: u8 = 0x01;

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Destination that holds at most `limit` bytes in total
#[derive(Debug, Default)]
pub struct FaultySink {
    pub data: Vec<u8>,
    limit: usize,
}

impl FaultySink {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }
}

impl TransferSink for FaultySink {
    fn accept(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        let room = self.limit.saturating_sub(self.data.len());
        if bytes.len() > room {
            return Err(TransferFault::new(bytes.len(), bytes.len() - room));
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

/// Source whose bytes from the first `WANT_FAULT` onward are unreadable
#[derive(Debug, Clone)]
pub struct FaultySource {
    data: Vec<u8>,
}

impl FaultySource {
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl TransferSource for FaultySource {
    fn provide(&self, dest: &mut [u8]) -> Result<(), TransferFault> {
        let readable = self
            .data
            .iter()
            .position(|b| *b == WANT_FAULT)
            .unwrap_or(self.data.len());
        if dest.len() > readable {
            return Err(TransferFault::new(dest.len(), dest.len() - readable));
        }
        dest.copy_from_slice(&self.data[..dest.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faulty_sink_limit() {
        let mut sink = FaultySink::new(4);
        sink.accept(b"abc").unwrap();
        assert_eq!(sink.accept(b"de"), Err(TransferFault::new(2, 1)));
        assert_eq!(sink.data, b"abc");
    }

    #[test]
    fn test_faulty_source_stops_at_marker() {
        let source = FaultySource::new(b"ab\x01cd");
        let mut two = [0u8; 2];
        source.provide(&mut two).unwrap();
        assert_eq!(&two, b"ab");

        let mut four = [0u8; 4];
        assert_eq!(source.provide(&mut four), Err(TransferFault::new(4, 2)));
    }
}
