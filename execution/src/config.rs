//! Settings shared by the execution contexts.

use opforge_core::{DeviceKind, DeviceSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_MEMORY_LIMIT: &str = "OPFORGE_MEMORY_LIMIT";
pub const ENV_DEFAULT_DEVICE: &str = "OPFORGE_DEFAULT_DEVICE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Execution context configuration.
///
/// ```yaml
/// memory_limit_bytes: 1048576
/// host_devices: 2
/// default_device: "CPU:0"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Cap on live tensor storage for eager contexts; `None` means unbounded.
    pub memory_limit_bytes: Option<usize>,
    /// Number of host devices (`CPU:0` .. `CPU:n-1`) an eager context exposes.
    pub host_devices: usize,
    /// Placement used when an operation names no device.
    pub default_device: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            memory_limit_bytes: None,
            host_devices: 1,
            default_device: "CPU:0".to_string(),
        }
    }
}

impl ContextConfig {
    pub fn from_yaml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: ContextConfig = serde_yaml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `OPFORGE_MEMORY_LIMIT` / `OPFORGE_DEFAULT_DEVICE` from the environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_MEMORY_LIMIT) {
            let limit = raw.trim().parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                key: ENV_MEMORY_LIMIT,
                reason: format!("'{raw}': {e}"),
            })?;
            self.memory_limit_bytes = Some(limit);
        }
        if let Some(device) = lookup(ENV_DEFAULT_DEVICE) {
            self.default_device = device;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_devices == 0 {
            return Err(ConfigError::InvalidValue {
                key: "host_devices",
                reason: "at least one host device is required".into(),
            });
        }
        self.default_device_spec().map(|_| ())
    }

    /// Parsed `default_device`; must be one of the host devices.
    pub fn default_device_spec(&self) -> Result<DeviceSpec, ConfigError> {
        let spec: DeviceSpec = self.default_device.parse().map_err(|e: opforge_core::Error| {
            ConfigError::InvalidValue { key: "default_device", reason: e.message().to_string() }
        })?;
        if spec.kind != DeviceKind::Cpu || spec.index >= self.host_devices {
            return Err(ConfigError::InvalidValue {
                key: "default_device",
                reason: format!("{spec} is not one of the {} host devices", self.host_devices),
            });
        }
        Ok(spec)
    }
}
