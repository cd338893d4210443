//! bufdev CLI Demo
//!
//! Activates one device, lets a few concurrent sessions read the initial
//! payload, then writes each stdin line into the device and reads it back.
//!
//! Usage: `cargo run -p bufdev --features demo --bin bufdev_demo -- [config.json]`

use bufdev::{DeviceConfig, DeviceError, DeviceFile, DeviceHandle, DeviceRegistry, Registration};
use std::io::{self, BufRead};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DeviceConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => DeviceConfig::default(),
    };

    let registry = Arc::new(DeviceRegistry::new());
    let handle = registry.activate_config(&config)?;
    if let Some(info) = registry.info(handle) {
        println!(
            "Activated {}/{} as {} ({:?})",
            info.class, info.name, info.number, info.sync
        );
    }

    let readers: Vec<_> = (1..=3)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(read_all(format!("r{i}"), registry, handle))
        })
        .collect();
    for reader in readers {
        reader.await??;
    }

    write_lines(&registry, handle, config.capacity)?;

    registry.deactivate(handle)?;
    println!("Device deactivated");
    Ok(())
}

async fn read_all(
    name: String,
    registry: Arc<DeviceRegistry>,
    handle: DeviceHandle,
) -> Result<(), DeviceError> {
    let mut file = DeviceFile::open(registry, handle)?;
    let mut buf = [0u8; 4];

    loop {
        let n = embedded_io_async::Read::read(&mut file, &mut buf).await?;
        if n == 0 {
            println!("({name}) EOF");
            break;
        }
        println!("({name}): {}", String::from_utf8_lossy(&buf[..n]));
    }
    file.close()
}

fn write_lines(
    registry: &Arc<DeviceRegistry>,
    handle: DeviceHandle,
    capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = registry.open_file(handle)?;
    let mut buf = vec![0u8; capacity];

    println!("Enter text (empty line to quit):");
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }

        let written = file.write(trimmed.as_bytes())?;
        file.rewind();
        let read = file.read(&mut buf)?;
        println!(
            "wrote {written} of {} bytes, read back {:?}",
            trimmed.len(),
            String::from_utf8_lossy(&buf[..read])
        );
    }

    file.close()?;
    Ok(())
}
