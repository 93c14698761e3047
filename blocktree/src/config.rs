//! Inspector configuration.
//!
//! Configuration is loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BTREE_PATH`: File backing the block store (required)
//! - `BTREE_KEY_SIZE`: Key size in bytes (default: `8`)
//! - `BTREE_VALUE_SIZE`: Value size in bytes (default: `8`)
//! - `BTREE_BLOCK_SIZE`: Block size in bytes (default: `512`)
//! - `BTREE_BLOCK_COUNT`: Blocks in a newly created file (default: `1024`)
//! - `BTREE_DISPLAY`: `depth`, `dot` or `sorted` (default: `depth`)
//!
//! # Invariants
//!
//! - sizes and counts are always positive
//! - `path` is never empty (the file may not exist yet)

use std::path::PathBuf;

use crate::btree::DisplayFormat;

/// Inspector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// File backing the block store. Created if it does not exist.
    pub path: PathBuf,
    /// Key size in bytes.
    pub key_size: usize,
    /// Value size in bytes.
    pub value_size: usize,
    /// Block size in bytes.
    pub block_size: usize,
    /// Number of blocks when the file has to be created.
    pub block_count: u64,
    /// How to print the tree.
    pub display: DisplayFormat,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl IndexConfig {
    pub const DEFAULT_KEY_SIZE: usize = 8;
    pub const DEFAULT_VALUE_SIZE: usize = 8;
    pub const DEFAULT_BLOCK_SIZE: usize = 512;
    pub const DEFAULT_BLOCK_COUNT: u64 = 1024;

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = match lookup("BTREE_PATH") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    name: "BTREE_PATH".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            None => return Err(ConfigError::MissingEnvVar("BTREE_PATH".to_string())),
        };

        let display = match lookup("BTREE_DISPLAY") {
            Some(value) => value
                .parse::<DisplayFormat>()
                .map_err(|message| ConfigError::InvalidValue {
                    name: "BTREE_DISPLAY".to_string(),
                    message,
                })?,
            None => DisplayFormat::default(),
        };

        Ok(Self {
            path,
            key_size: load_positive(&lookup, "BTREE_KEY_SIZE", Self::DEFAULT_KEY_SIZE)?,
            value_size: load_positive(&lookup, "BTREE_VALUE_SIZE", Self::DEFAULT_VALUE_SIZE)?,
            block_size: load_positive(&lookup, "BTREE_BLOCK_SIZE", Self::DEFAULT_BLOCK_SIZE)?,
            block_count: load_positive(&lookup, "BTREE_BLOCK_COUNT", Self::DEFAULT_BLOCK_COUNT)?,
            display,
        })
    }
}

/// Parse a positive integer, returning `default` if the variable is unset.
fn load_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    match value.parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
    }
}
