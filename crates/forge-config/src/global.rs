//! Global Configuration (~/.forge/config.toml)
//!
//! Handles user-level resolution defaults stored in `~/.forge/config.toml`.

use crate::resolution::ResolutionConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.forge/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Resolution defaults applied beneath every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(resolution) = &self.resolution {
            resolution.validate()?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.forge/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".forge").join("config.toml"))
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        match (&mut self.resolution, &other.resolution) {
            (Some(mine), Some(theirs)) => mine.merge(theirs),
            (None, Some(theirs)) => self.resolution = Some(theirs.clone()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::LockMode;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
[resolution]
locking = true
lock-mode = "lenient"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        let resolution = config.resolution.unwrap();
        assert_eq!(resolution.locking, Some(true));
        assert_eq!(resolution.lock_mode, Some(LockMode::Lenient));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = GlobalConfig::load_from_file(&temp_dir.path().join("config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[resolution\nlocking = true").unwrap();

        let result = GlobalConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = GlobalConfig::default();
        let other = GlobalConfig {
            resolution: Some(ResolutionConfig {
                write_locks: Some(true),
                ..Default::default()
            }),
        };

        base.merge(&other);
        assert_eq!(base.resolution.unwrap().write_locks, Some(true));
    }
}
