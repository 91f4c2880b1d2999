//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid config.
//!
//! ```toml
//! [world]
//! capacity = 65536
//! initial_reserve = 1024
//!
//! [scheduler]
//! priority_spacing = 100
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::MAX_INDEX;
use crate::error::{ConfigError, ConfigResult};

/// Default maximum number of live entities.
pub const DEFAULT_CAPACITY: usize = 65_536;

/// Default gap between consecutive system priorities.
pub const DEFAULT_PRIORITY_SPACING: u32 = 100;

/// Object store sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of simultaneously live entities.
    pub capacity: usize,
    /// Slots to reserve up front.
    pub initial_reserve: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            initial_reserve: 0,
        }
    }
}

/// System scheduling options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Gap between the priorities of consecutive systems in execution order.
    pub priority_spacing: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            priority_spacing: DEFAULT_PRIORITY_SPACING,
        }
    }
}

/// Top-level runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Object store sizing.
    pub world: WorldConfig,
    /// System scheduling options.
    pub scheduler: SchedulerConfig,
}

impl RuntimeConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can not be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded runtime config from {}", path.display());
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        let max_capacity = MAX_INDEX as usize + 1;
        if self.world.capacity == 0 {
            return Err(ConfigError::Invalid(
                "world.capacity must be greater than zero".to_string(),
            ));
        }
        if self.world.capacity > max_capacity {
            return Err(ConfigError::Invalid(format!(
                "world.capacity {} exceeds the addressable maximum {max_capacity}",
                self.world.capacity
            )));
        }
        if self.scheduler.priority_spacing == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.priority_spacing must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
