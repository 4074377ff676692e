//! Project Configuration (forge.toml)
//!
//! Handles project-level configuration stored in `forge.toml` at the project root.

use crate::resolution::ResolutionConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Version used for modules that do not declare one
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// Project configuration from forge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Owning module identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSection>,

    /// Resolution settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionConfig>,

    /// Declared configurations, keyed by name
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub configurations: BTreeMap<String, ConfigurationSection>,
}

/// Module identity of the project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Module group (may be empty)
    #[serde(default)]
    pub group: String,

    /// Module name
    pub name: String,

    /// Module version (default: "unspecified")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Path of this project inside its build (e.g. ":app")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ProjectSection {
    /// Declared version, or "unspecified"
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(UNSPECIFIED_VERSION)
    }
}

/// A declared configuration (`[configurations.<name>]`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationSection {
    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Dependency notations ("group:name:requirement")
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Attributes used for variant matching
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Per-configuration locking override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locking: Option<bool>,
}

impl ProjectConfig {
    /// Parse project configuration from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config = Self::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(project) = &self.project {
            if project.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }

            if let Some(version) = &project.version {
                if !is_valid_version(version) {
                    return Err(ConfigError::InvalidVersion(version.clone()));
                }
            }
        }

        if let Some(resolution) = &self.resolution {
            resolution.validate()?;
        }

        for (name, section) in &self.configurations {
            validate_configuration(name, section)?;
        }

        Ok(())
    }

    /// Get the project name, if present
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Look up a declared configuration
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationSection> {
        self.configurations.get(name)
    }
}

/// Basic version validation: X.Y or X.Y.Z with optional pre-release/build suffix
fn is_valid_version(version: &str) -> bool {
    if version == UNSPECIFIED_VERSION {
        return true;
    }

    let main_version = version.split(['-', '+']).next().unwrap_or("");
    let parts: Vec<&str> = main_version.split('.').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return false;
    }

    parts
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Validate a declared configuration.
///
/// Only the notation shape is checked here; version requirements are parsed
/// when the configuration is turned into a resolvable one.
fn validate_configuration(name: &str, section: &ConfigurationSection) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "configurations".to_string(),
            reason: "configuration name cannot be empty".to_string(),
        });
    }

    for notation in &section.dependencies {
        let parts: Vec<&str> = notation.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 || parts[..2].iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("configurations.{}.dependencies", name),
                reason: format!("'{}' is not in 'group:name[:version]' form", notation),
            });
        }
    }

    Ok(())
}
