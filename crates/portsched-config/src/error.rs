//! Error types for pool configuration.

use std::path::PathBuf;

use crate::op_class::OpClass;

/// Errors that can occur while building, loading, or validating a pool.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing pool files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pool file not found.
    #[error("pool file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Validation error in a pool definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },

    /// An override referenced a unit index past the end of the unit list.
    #[error("no unit at index {index} (pool has {len} units)")]
    UnknownUnit {
        /// The requested index.
        index: usize,
        /// Number of declared units.
        len: usize,
    },

    /// An override referenced an operation class the unit does not declare.
    #[error("unit {unit} ('{name}') does not declare {op_class}")]
    UnknownOpClass {
        /// Unit index.
        unit: usize,
        /// Unit name.
        name: String,
        /// The missing class.
        op_class: OpClass,
    },

    /// A string did not name any operation class.
    #[error("unknown operation class '{name}'")]
    ParseOpClass {
        /// The rejected name.
        name: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
