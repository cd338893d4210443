use serde::{Deserialize, Serialize};

use crate::store::{DEFAULT_CAPACITY, DEFAULT_PAYLOAD};

/// Locking discipline of an activated device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Plain [`BufferStore`](crate::BufferStore), no internal lock
    #[default]
    Unsynchronized,
    /// [`SharedStore`](crate::SharedStore), one mutex around every operation
    Serialized,
}

/// Activation settings for one device
///
/// Every field is optional in JSON; missing fields take the defaults of
/// the classic `hello_world` device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,
    pub class: String,
    pub capacity: usize,
    pub initial_payload: String,
    pub sync: SyncMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse device config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read device config: {0:?}")]
    Read(embedded_io::ErrorKind),

    #[error("invalid device config: {0}")]
    Invalid(String),
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "hello_world".to_string(),
            class: "hello".to_string(),
            capacity: DEFAULT_CAPACITY,
            initial_payload: DEFAULT_PAYLOAD.to_string(),
            sync: SyncMode::default(),
        }
    }
}

impl DeviceConfig {
    /// Parse and validate a JSON config
    ///
    /// # Errors
    /// Malformed JSON, unknown fields, or a config that fails [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config to the end and parse it
    ///
    /// # Errors
    /// I/O errors from the reader, plus everything [`Self::from_json`] reports.
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, ConfigError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(ConfigError::Read(embedded_io::Error::kind(&e))),
            }
        }

        let config: Self = serde_json::from_slice(&buffer)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Zero capacity or an empty device name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be positive".to_string()));
        }
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("device name is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = DeviceConfig::from_json("{}").unwrap();
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.sync, SyncMode::Unsynchronized);
    }

    #[test]
    fn test_partial_override() {
        let config =
            DeviceConfig::from_json(r#"{"name": "scratch", "capacity": 16, "sync": "serialized"}"#)
                .unwrap();
        assert_eq!(config.name, "scratch");
        assert_eq!(config.class, "hello");
        assert_eq!(config.capacity, 16);
        assert_eq!(config.sync, SyncMode::Serialized);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = DeviceConfig::from_json(r#"{"major": 42}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_zero_capacity_invalid() {
        let err = DeviceConfig::from_json(r#"{"capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let config = DeviceConfig {
            name: "scratch".to_string(),
            capacity: 64,
            sync: SyncMode::Serialized,
            ..DeviceConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""sync":"serialized""#), "{json}");
        assert_eq!(DeviceConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_reader() {
        let json: &[u8] = br#"{"initial_payload": "boot"}"#;
        let config = DeviceConfig::from_reader(json).unwrap();
        assert_eq!(config.initial_payload, "boot");
    }
}
