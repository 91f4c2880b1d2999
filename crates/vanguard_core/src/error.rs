//! # Runtime Error Types
//!
//! Only configuration mistakes and hard capacity limits are errors.
//! Stale identifiers and double frees are silent no-ops and never show up here.

use thiserror::Error;

/// Errors raised by the object store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Every identifier slot is in use.
    #[error("entity capacity exhausted: all {capacity} slots are live")]
    CapacityExhausted {
        /// Configured slot capacity.
        capacity: usize,
    },
}

/// Result type for object store operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised by the system registry.
///
/// All of these are startup-time configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A system with this name is already registered.
    #[error("system '{0}' is already registered")]
    DuplicateSystem(String),

    /// A system depends on a name nobody registered.
    #[error("system '{system}' depends on unknown system '{dependency}'")]
    UnknownDependency {
        /// The system declaring the dependency.
        system: String,
        /// The unresolved dependency name.
        dependency: String,
    },

    /// The dependency graph contains a cycle.
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency {
        /// The cycle as a dependency path, first system repeated at the end.
        cycle: Vec<String>,
    },

    /// A factory produced a system whose name differs from its definition.
    #[error("system definition '{expected}' produced a system named '{actual}'")]
    NameMismatch {
        /// Name declared by the definition.
        expected: String,
        /// Name reported by the constructed system.
        actual: String,
    },

    /// Validation failed; nothing was instantiated.
    #[error("system registry validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`crate::RuntimeConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
