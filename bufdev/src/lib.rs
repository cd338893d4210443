pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod file;
pub mod idgen;
pub mod mocked;
pub mod registry;
pub mod store;
pub mod transfer;

// Re-export the core store for convenience
pub use store::{BufferStore, ReadOutcome, DEFAULT_CAPACITY, DEFAULT_PAYLOAD};

// Re-export the endpoint contract and its serialized variant
pub use endpoint::{Endpoint, SharedStore};

// Re-export transfer channel traits
pub use transfer::{TransferSink, TransferSource};

// Re-export error types
pub use error::{DeviceError, RegistrationError, StoreError, TransferFault};

// Re-export diagnostics
pub use event::{Event, EventKind, EventSink, LogSink, NullSink};

// Re-export the reference host
pub use config::{ConfigError, DeviceConfig, SyncMode};
pub use file::DeviceFile;
pub use idgen::{DeviceHandle, DeviceNumber};
pub use registry::{Backing, DeviceInfo, DeviceRegistry, Registration};
