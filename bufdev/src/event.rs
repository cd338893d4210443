//! Diagnostic events emitted by the store
//!
//! The store produces `{kind, count}` records only. Rendering them is the
//! job of an [`EventSink`]; [`LogSink`] renders through the `log` facade.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `count` is the open counter after the increment
    Opened,
    /// `count` is the number of bytes delivered to the caller
    Sent,
    /// `count` is the number of bytes the destination did not take
    SendFailed,
    /// Read at or past the logical length, `count` is 0
    EndOfData,
    /// `count` is the number of bytes accepted from the caller
    Received,
    /// `count` is the number of bytes the source did not provide
    ReceiveFailed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub count: usize,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, count: usize) -> Self {
        Self { kind, count }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Opened => write!(f, "Device has been opened {} time(s)", self.count),
            EventKind::Sent => write!(f, "Sent {} characters to the user", self.count),
            EventKind::SendFailed => {
                write!(f, "Failed to send {} characters to the user", self.count)
            }
            EventKind::EndOfData => write!(f, "End of data"),
            EventKind::Received => write!(f, "Received {} characters from the user", self.count),
            EventKind::ReceiveFailed => {
                write!(f, "Failed to receive {} characters from the user", self.count)
            }
            EventKind::Closed => write!(f, "Device successfully closed"),
        }
    }
}

/// Observability collaborator receiving store events
pub trait EventSink: Send {
    fn emit(&mut self, event: Event);
}

/// Renders events as `log` records, prefixed with a device label
#[derive(Debug, Clone)]
pub struct LogSink {
    label: String,
}

impl LogSink {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("bufdev")
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: Event) {
        match event.kind {
            EventKind::EndOfData => log::debug!(target: "bufdev", "{}: {event}", self.label),
            _ => log::info!(target: "bufdev", "{}: {event}", self.label),
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: Event) {}
}
