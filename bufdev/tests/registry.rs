//! Integration tests for the reference host

use std::sync::Arc;

use bufdev::{
    BufferStore, DeviceConfig, DeviceError, DeviceNumber, DeviceRegistry, ReadOutcome,
    Registration, RegistrationError, SharedStore, StoreError, SyncMode,
};

#[test]
fn test_activate_config_defaults() {
    let registry = DeviceRegistry::new();
    let handle = registry.activate_config(&DeviceConfig::default()).unwrap();

    let info = registry.info(handle).unwrap();
    assert_eq!(info.name, "hello_world");
    assert_eq!(info.class, "hello");
    assert_eq!(info.number, DeviceNumber { major: 254, minor: 0 });
    assert_eq!(info.sync, SyncMode::Unsynchronized);
    assert_eq!(registry.lookup("hello_world"), Some(handle));
}

#[test]
fn test_duplicate_name_rejected() {
    let registry = DeviceRegistry::new();
    registry.activate_config(&DeviceConfig::default()).unwrap();

    let err = registry
        .activate_config(&DeviceConfig::default())
        .unwrap_err();
    assert_eq!(err, RegistrationError::NameInUse("hello_world".to_string()));
    assert_eq!(registry.devices().len(), 1);
}

#[test]
fn test_invalid_config_registers_nothing() {
    let registry = DeviceRegistry::new();
    let config = DeviceConfig {
        capacity: 0,
        ..DeviceConfig::default()
    };

    assert!(matches!(
        registry.activate_config(&config),
        Err(RegistrationError::InvalidConfig(_))
    ));
    assert!(registry.devices().is_empty());
    assert_eq!(registry.lookup("hello_world"), None);
}

#[test]
fn test_failed_allocation_registers_nothing() {
    let registry = DeviceRegistry::new();
    let config = DeviceConfig {
        capacity: usize::MAX,
        ..DeviceConfig::default()
    };

    let err = registry.activate_config(&config).unwrap_err();
    assert!(matches!(err, RegistrationError::Store(StoreError::Alloc(_))), "{err:?}");
    assert!(registry.devices().is_empty());
    assert_eq!(registry.lookup("hello_world"), None);

    // The name stays free for a later activation
    let handle = registry.activate_config(&DeviceConfig::default()).unwrap();
    assert_eq!(registry.info(handle).unwrap().number.major, 254);
}

#[test]
fn test_dispatch_round_trip() {
    let registry = DeviceRegistry::new();
    let handle = registry
        .activate("scratch", BufferStore::with_payload(8, b"seed").unwrap().into())
        .unwrap();

    assert_eq!(registry.dispatch_open(handle), Ok(1));
    assert_eq!(registry.dispatch_write(handle, 100, &b"0123456789"[..]), Ok(7));

    let mut out = Vec::new();
    let outcome = registry.dispatch_read(handle, 0, 100, &mut out).unwrap();
    assert_eq!(outcome, ReadOutcome::Delivered { bytes: 7, new_offset: 7 });
    assert_eq!(out, b"0123456");

    registry.dispatch_close(handle).unwrap();
}

#[test]
fn test_dispatch_fault_surfaces_as_device_error() {
    let registry = DeviceRegistry::new();
    let handle = registry.activate_config(&DeviceConfig::default()).unwrap();

    let err = registry
        .dispatch_write(handle, 5, &b"ab"[..])
        .unwrap_err();
    assert!(matches!(err, DeviceError::Fault(_)));
    assert_eq!(err.errno(), 14);
}

#[test]
fn test_deactivated_handle_rejected() {
    let registry = Arc::new(DeviceRegistry::new());
    let handle = registry.activate_config(&DeviceConfig::default()).unwrap();
    let mut file = registry.open_file(handle).unwrap();

    registry.deactivate(handle).unwrap();

    let mut buf = [0u8; 8];
    let err = file.read(&mut buf).unwrap_err();
    assert_eq!(
        err,
        DeviceError::Registration(RegistrationError::UnknownDevice(handle.id()))
    );
    assert!(file.close().is_err());
    assert_eq!(
        registry.deactivate(handle),
        Err(RegistrationError::UnknownDevice(handle.id()))
    );
}

#[test]
fn test_sessions_have_independent_positions() {
    let registry = Arc::new(DeviceRegistry::new());
    let handle = registry.activate_config(&DeviceConfig::default()).unwrap();

    let mut first = registry.open_file(handle).unwrap();
    let mut second = registry.open_file(handle).unwrap();

    let mut buf = [0u8; 6];
    assert_eq!(first.read(&mut buf).unwrap(), 6);
    assert_eq!(&buf, b"Hello ");
    assert_eq!(first.read(&mut buf).unwrap(), 6);
    assert_eq!(&buf, b"from k");

    assert_eq!(second.read(&mut buf).unwrap(), 6);
    assert_eq!(&buf, b"Hello ");
    assert_eq!(first.position(), 12);
    assert_eq!(second.position(), 6);
}

#[test]
fn test_serialized_device_shares_store() {
    let registry = DeviceRegistry::new();
    let shared = SharedStore::new(BufferStore::new().unwrap());
    let handle = registry.activate("shared", shared.clone().into()).unwrap();

    registry.dispatch_open(handle).unwrap();
    registry.dispatch_write(handle, 4, &b"sync"[..]).unwrap();

    let store = shared.lock();
    assert_eq!(store.payload(), b"sync");
    assert_eq!(store.open_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serialized_device_across_tasks() {
    let registry = Arc::new(DeviceRegistry::new());
    let config = DeviceConfig {
        sync: SyncMode::Serialized,
        ..DeviceConfig::default()
    };
    let handle = registry.activate_config(&config).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let mut file = registry.open_file(handle).unwrap();
                let payload = format!("writer-{i}");
                file.write(payload.as_bytes()).unwrap();
                file.rewind();
                let mut buf = [0u8; 64];
                let n = file.read(&mut buf).unwrap();
                buf[..n].to_vec()
            })
        })
        .collect();

    for task in tasks {
        let seen = task.await.unwrap();
        // Whole payloads only: a write is never visible half-done
        let text = String::from_utf8(seen).unwrap();
        assert!(text.starts_with("writer-") && text.len() == 8, "{text}");
    }

    let mut out = Vec::new();
    registry.dispatch_read(handle, 0, 1024, &mut out).unwrap();
    assert_eq!(out.len(), 8);
}
