//! Error types for the store, the reference host and device sessions.
//!
//! Also maps errors to errno values and `embedded_io::ErrorKind`.

use core::ffi::c_int;

pub const EBADF: c_int = 9;
pub const ENOMEM: c_int = 12;
pub const EFAULT: c_int = 14;
pub const EBUSY: c_int = 16;
pub const ENODEV: c_int = 19;
pub const EINVAL: c_int = 22;

/// A byte channel rejected a copy.
///
/// `not_copied` mirrors the "bytes left uncopied" count a host copy
/// routine reports. The store is never modified when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transfer fault: {not_copied} of {requested} bytes not copied")]
pub struct TransferFault {
    pub requested: usize,
    pub not_copied: usize,
}

impl TransferFault {
    #[must_use]
    pub fn new(requested: usize, not_copied: usize) -> Self {
        Self {
            requested,
            not_copied,
        }
    }
}

/// Failure to create a store. Terminal at activation time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("buffer capacity must be positive")]
    ZeroCapacity,

    #[error("failed to allocate {0} bytes for the buffer")]
    Alloc(usize),
}

/// Errors from the registration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("device name already registered: {0}")]
    NameInUse(String),

    #[error("no such device: {0}")]
    UnknownDevice(i64),

    #[error("no free major number")]
    NoMajor,

    #[error("invalid device configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to create device store: {0}")]
    Store(#[from] StoreError),
}

/// Errors seen by a caller session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Fault(#[from] TransferFault),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("device file is closed")]
    Closed,
}

impl DeviceError {
    /// errno the reference host would hand back for this error
    #[must_use]
    pub fn errno(&self) -> c_int {
        match self {
            Self::Fault(_) => EFAULT,
            Self::Closed => EBADF,
            Self::Registration(e) => match e {
                RegistrationError::UnknownDevice(_) => ENODEV,
                RegistrationError::NameInUse(_) | RegistrationError::NoMajor => EBUSY,
                RegistrationError::InvalidConfig(_) => EINVAL,
                RegistrationError::Store(_) => ENOMEM,
            },
        }
    }
}

impl embedded_io::Error for DeviceError {
    fn kind(&self) -> embedded_io::ErrorKind {
        errno_to_error_kind(self.errno())
    }
}

/// Convert errno to `embedded_io::ErrorKind`
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn errno_to_error_kind(errno: c_int) -> embedded_io::ErrorKind {
    match errno {
        1 | 13 => embedded_io::ErrorKind::PermissionDenied, // EPERM, EACCES
        2 | ENODEV => embedded_io::ErrorKind::NotFound,
        EBADF | EINVAL | EFAULT => embedded_io::ErrorKind::InvalidInput,
        ENOMEM | 28 => embedded_io::ErrorKind::OutOfMemory, // ENOSPC
        EBUSY => embedded_io::ErrorKind::AddrInUse,
        _ => embedded_io::ErrorKind::Other,
    }
}
