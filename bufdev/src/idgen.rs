use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Identifies one activation of a device in a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    id: i64,
}

impl DeviceHandle {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }
}

/// Numeric identifier a device is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Thread-safe handle ID generator
#[derive(Debug)]
pub struct IdGen {
    next_id: AtomicI64,
}

impl IdGen {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }

    pub fn next_handle(&self) -> DeviceHandle {
        DeviceHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest major handed out by dynamic allocation
pub const DYNAMIC_MAJOR_FIRST: u32 = 254;
/// Lowest major handed out by dynamic allocation
pub const DYNAMIC_MAJOR_LAST: u32 = 234;

/// Pick the highest free major in the dynamic range
///
/// Returns `None` when every major in the range is taken.
pub fn allocate_major(in_use: impl Fn(u32) -> bool) -> Option<u32> {
    (DYNAMIC_MAJOR_LAST..=DYNAMIC_MAJOR_FIRST)
        .rev()
        .find(|major| !in_use(*major))
}
