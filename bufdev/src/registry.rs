//! Registration collaborator and an in-process reference host
//!
//! A host activates stores under a name and a numeric identifier, routes
//! open/read/write/close calls into them, and deactivates them. The
//! store itself knows nothing about names, numbers or sessions.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{DeviceConfig, SyncMode};
use crate::endpoint::{Endpoint, SharedStore};
use crate::error::{DeviceError, RegistrationError, TransferFault};
use crate::event::LogSink;
use crate::file::DeviceFile;
use crate::idgen::{allocate_major, DeviceHandle, DeviceNumber, IdGen};
use crate::store::{BufferStore, ReadOutcome};
use crate::transfer::{TransferSink, TransferSource};

/// A store as held by a host, in either locking discipline
#[derive(Debug)]
pub enum Backing {
    Unsynchronized(BufferStore),
    Serialized(SharedStore),
}

impl Backing {
    #[must_use]
    pub fn sync_mode(&self) -> SyncMode {
        match self {
            Self::Unsynchronized(_) => SyncMode::Unsynchronized,
            Self::Serialized(_) => SyncMode::Serialized,
        }
    }
}

impl From<BufferStore> for Backing {
    fn from(store: BufferStore) -> Self {
        Self::Unsynchronized(store)
    }
}

impl From<SharedStore> for Backing {
    fn from(store: SharedStore) -> Self {
        Self::Serialized(store)
    }
}

impl Endpoint for Backing {
    fn open(&mut self) -> usize {
        match self {
            Self::Unsynchronized(store) => store.open(),
            Self::Serialized(store) => store.open(),
        }
    }

    fn read<S: TransferSink + ?Sized>(
        &mut self,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, TransferFault> {
        match self {
            Self::Unsynchronized(store) => store.read(offset, length, sink),
            Self::Serialized(store) => store.read(offset, length, sink),
        }
    }

    fn write<S: TransferSource + ?Sized>(
        &mut self,
        length: usize,
        source: &S,
    ) -> Result<usize, TransferFault> {
        match self {
            Self::Unsynchronized(store) => store.write(length, source),
            Self::Serialized(store) => store.write(length, source),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Unsynchronized(store) => store.close(),
            Self::Serialized(store) => store.close(),
        }
    }
}

/// Host-side lifecycle and per-call dispatch
pub trait Registration {
    /// Make `store` reachable under `name`
    ///
    /// # Errors
    /// The name is taken or no identifier is available.
    fn activate(&self, name: &str, store: Backing) -> Result<DeviceHandle, RegistrationError>;

    /// Remove the device; the store is dropped
    ///
    /// # Errors
    /// Unknown handle.
    fn deactivate(&self, handle: DeviceHandle) -> Result<(), RegistrationError>;

    /// # Errors
    /// Unknown handle.
    fn dispatch_open(&self, handle: DeviceHandle) -> Result<usize, RegistrationError>;

    /// # Errors
    /// Unknown handle or a transfer fault.
    fn dispatch_read<S: TransferSink + ?Sized>(
        &self,
        handle: DeviceHandle,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, DeviceError>;

    /// # Errors
    /// Unknown handle or a transfer fault.
    fn dispatch_write<S: TransferSource + ?Sized>(
        &self,
        handle: DeviceHandle,
        length: usize,
        source: &S,
    ) -> Result<usize, DeviceError>;

    /// # Errors
    /// Unknown handle.
    fn dispatch_close(&self, handle: DeviceHandle) -> Result<(), RegistrationError>;
}

/// Public description of an activated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub handle: DeviceHandle,
    pub name: String,
    pub class: String,
    pub number: DeviceNumber,
    pub sync: SyncMode,
}

struct Device {
    info: DeviceInfo,
    backing: Backing,
}

/// In-process host keeping activated devices in a table
///
/// Uses interior mutability so it can be shared through `Arc<DeviceRegistry>`.
///
/// # Thread Safety
///
/// The device table is guarded by a `parking_lot::Mutex`. Calls into an
/// unsynchronized store run under the table lock, since that lock is what
/// grants `&mut` access to it. Serialized stores are cloned out of the
/// table and called after the table lock is released, so only their own
/// lock is held during a transfer.
pub struct DeviceRegistry {
    devices: Mutex<Vec<Device>>,
    id_gen: IdGen,
    default_class: String,
}

impl DeviceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_class("bufdev")
    }

    /// Create an empty registry whose `activate` registers under `class`
    #[must_use]
    pub fn with_class(class: &str) -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
            id_gen: IdGen::new(),
            default_class: class.to_string(),
        }
    }

    /// Allocate a store from `config` and activate it
    ///
    /// Store allocation failure is terminal: nothing stays registered.
    ///
    /// # Errors
    /// Invalid config, allocation failure, or any `activate` error.
    pub fn activate_config(&self, config: &DeviceConfig) -> Result<DeviceHandle, RegistrationError> {
        config
            .validate()
            .map_err(|e| RegistrationError::InvalidConfig(e.to_string()))?;
        info!(device = %config.name, "initializing device");

        let store = BufferStore::with_payload(config.capacity, config.initial_payload.as_bytes())
            .map_err(|e| {
                error!(device = %config.name, error = %e, "failed to allocate device buffer");
                e
            })?
            .with_sink(LogSink::new(&config.name));

        let backing = match config.sync {
            SyncMode::Unsynchronized => Backing::Unsynchronized(store),
            SyncMode::Serialized => Backing::Serialized(SharedStore::new(store)),
        };
        self.register(&config.name, &config.class, backing)
    }

    /// Open a session on an activated device
    ///
    /// # Errors
    /// Unknown handle.
    pub fn open_file(self: &Arc<Self>, handle: DeviceHandle) -> Result<DeviceFile<Self>, DeviceError> {
        DeviceFile::open(Arc::clone(self), handle)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<DeviceHandle> {
        let devices = self.devices.lock();
        devices
            .iter()
            .find(|d| d.info.name == name)
            .map(|d| d.info.handle)
    }

    #[must_use]
    pub fn info(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
        let devices = self.devices.lock();
        devices
            .iter()
            .find(|d| d.info.handle == handle)
            .map(|d| d.info.clone())
    }

    /// All active devices, in activation order
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceInfo> {
        let devices = self.devices.lock();
        devices.iter().map(|d| d.info.clone()).collect()
    }

    fn register(
        &self,
        name: &str,
        class: &str,
        backing: Backing,
    ) -> Result<DeviceHandle, RegistrationError> {
        let mut devices = self.devices.lock();

        if devices.iter().any(|d| d.info.name == name) {
            warn!(device = %name, "device name already registered");
            return Err(RegistrationError::NameInUse(name.to_string()));
        }

        let Some(major) = allocate_major(|major| devices.iter().any(|d| d.info.number.major == major))
        else {
            error!(device = %name, "failed to register a major number");
            return Err(RegistrationError::NoMajor);
        };

        let info = DeviceInfo {
            handle: self.id_gen.next_handle(),
            name: name.to_string(),
            class: class.to_string(),
            number: DeviceNumber { major, minor: 0 },
            sync: backing.sync_mode(),
        };
        info!(
            device = %name,
            class = %class,
            major,
            "registered correctly with major number {major}"
        );

        let handle = info.handle;
        devices.push(Device { info, backing });
        Ok(handle)
    }

    /// Run `f` against the device's store
    fn with_backing<T>(
        &self,
        handle: DeviceHandle,
        f: impl FnOnce(&mut Backing) -> T,
    ) -> Result<T, RegistrationError> {
        let mut devices = self.devices.lock();
        let Some(index) = devices.iter().position(|d| d.info.handle == handle) else {
            warn!(handle = handle.id(), "dispatch to unknown device");
            return Err(RegistrationError::UnknownDevice(handle.id()));
        };

        if let Backing::Serialized(shared) = &devices[index].backing {
            let mut detached = Backing::Serialized(shared.clone());
            drop(devices);
            return Ok(f(&mut detached));
        }
        Ok(f(&mut devices[index].backing))
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration for DeviceRegistry {
    fn activate(&self, name: &str, store: Backing) -> Result<DeviceHandle, RegistrationError> {
        self.register(name, &self.default_class, store)
    }

    fn deactivate(&self, handle: DeviceHandle) -> Result<(), RegistrationError> {
        let mut devices = self.devices.lock();
        let Some(index) = devices.iter().position(|d| d.info.handle == handle) else {
            return Err(RegistrationError::UnknownDevice(handle.id()));
        };
        let device = devices.remove(index);
        drop(devices);

        info!(
            device = %device.info.name,
            number = %device.info.number,
            "goodbye from the device"
        );
        Ok(())
    }

    fn dispatch_open(&self, handle: DeviceHandle) -> Result<usize, RegistrationError> {
        self.with_backing(handle, |backing| backing.open())
    }

    fn dispatch_read<S: TransferSink + ?Sized>(
        &self,
        handle: DeviceHandle,
        offset: usize,
        length: usize,
        sink: &mut S,
    ) -> Result<ReadOutcome, DeviceError> {
        debug!(handle = handle.id(), offset, length, "dispatch read");
        let outcome = self.with_backing(handle, |b| b.read(offset, length, sink))??;
        Ok(outcome)
    }

    fn dispatch_write<S: TransferSource + ?Sized>(
        &self,
        handle: DeviceHandle,
        length: usize,
        source: &S,
    ) -> Result<usize, DeviceError> {
        debug!(handle = handle.id(), length, "dispatch write");
        let accepted = self.with_backing(handle, |b| b.write(length, source))??;
        Ok(accepted)
    }

    fn dispatch_close(&self, handle: DeviceHandle) -> Result<(), RegistrationError> {
        self.with_backing(handle, |backing| backing.close())
    }
}
