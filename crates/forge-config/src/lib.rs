//! Forge Configuration System
//!
//! Provides the configuration consumed by dependency resolution:
//! - Project configuration (forge.toml): owning module, resolution settings,
//!   declared configurations and their dependencies
//! - Global user configuration (~/.forge/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.forge/config.toml)
//! 3. Project config (./forge.toml)
//! 4. Environment variables (FORGE_*)
//!
//! # Example
//!
//! ```no_run
//! use forge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let settings = config.effective_resolution();
//! ```

pub mod global;
pub mod loader;
pub mod project;
pub mod resolution;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{ConfigurationSection, ProjectConfig, ProjectSection};
pub use resolution::{ConflictStrategy, LockMode, ResolutionConfig, ResolutionSettings};
