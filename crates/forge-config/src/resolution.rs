//! Resolution settings
//!
//! The `[resolution]` table may appear in both the global and the project
//! configuration. Every field is optional so layers can be merged; the merged
//! result is turned into a fully-defaulted [`ResolutionSettings`] value.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default lockfile name, relative to the project root
pub const DEFAULT_LOCKFILE: &str = "forge.lock";

/// How version conflicts between requirements are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Pick the newest candidate version
    #[default]
    Latest,
    /// Report a resolution failure
    Fail,
}

impl FromStr for ConflictStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "fail" => Ok(Self::Fail),
            other => Err(ConfigError::InvalidValue {
                field: "resolution.conflict".to_string(),
                reason: format!("must be 'latest' or 'fail', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Dependency locking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Validate recorded lock state when present
    #[default]
    Default,
    /// Like `Default`, but a configuration without recorded lock state is an error
    Strict,
    /// Use recorded lock state as a preference only, never validate it
    Lenient,
}

impl FromStr for LockMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(ConfigError::InvalidValue {
                field: "resolution.lock-mode".to_string(),
                reason: format!("must be 'default', 'strict', or 'lenient', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

/// `[resolution]` table as written in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ResolutionConfig {
    /// Conflict strategy ("latest" or "fail")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictStrategy>,

    /// Enable dependency locking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locking: Option<bool>,

    /// Lock mode ("default", "strict", "lenient")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_mode: Option<LockMode>,

    /// Record resolution results into the lockfile instead of validating against it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_locks: Option<bool>,

    /// Lockfile location (default: "forge.lock")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockfile: Option<PathBuf>,
}

impl ResolutionConfig {
    /// Merge another resolution table into this one.
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ResolutionConfig) {
        if other.conflict.is_some() {
            self.conflict = other.conflict;
        }
        if other.locking.is_some() {
            self.locking = other.locking;
        }
        if other.lock_mode.is_some() {
            self.lock_mode = other.lock_mode;
        }
        if other.write_locks.is_some() {
            self.write_locks = other.write_locks;
        }
        if other.lockfile.is_some() {
            self.lockfile = other.lockfile.clone();
        }
    }

    /// Validate field values that serde cannot check
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(lockfile) = &self.lockfile {
            if lockfile.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "resolution.lockfile".to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fill unset fields with built-in defaults
    pub fn settings(&self) -> ResolutionSettings {
        let defaults = ResolutionSettings::default();
        ResolutionSettings {
            conflict: self.conflict.unwrap_or(defaults.conflict),
            locking: self.locking.unwrap_or(defaults.locking),
            lock_mode: self.lock_mode.unwrap_or(defaults.lock_mode),
            write_locks: self.write_locks.unwrap_or(defaults.write_locks),
            lockfile: self.lockfile.clone().unwrap_or(defaults.lockfile),
        }
    }
}

/// Fully-defaulted resolution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSettings {
    pub conflict: ConflictStrategy,
    pub locking: bool,
    pub lock_mode: LockMode,
    pub write_locks: bool,
    pub lockfile: PathBuf,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            conflict: ConflictStrategy::Latest,
            locking: false,
            lock_mode: LockMode::Default,
            write_locks: false,
            lockfile: PathBuf::from(DEFAULT_LOCKFILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_resolution_table() {
        let toml = r#"
conflict = "fail"
locking = true
lock-mode = "strict"
write-locks = false
lockfile = "locks/forge.lock"
"#;

        let config: ResolutionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.conflict, Some(ConflictStrategy::Fail));
        assert_eq!(config.lock_mode, Some(LockMode::Strict));
        assert_eq!(config.lockfile, Some(PathBuf::from("locks/forge.lock")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ResolutionConfig, _> = toml::from_str("lock-everything = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ResolutionConfig::default().settings();
        assert_eq!(settings, ResolutionSettings::default());
        assert_eq!(settings.lockfile, PathBuf::from("forge.lock"));
        assert!(!settings.locking);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = ResolutionConfig {
            conflict: Some(ConflictStrategy::Fail),
            locking: Some(false),
            ..Default::default()
        };
        let other = ResolutionConfig {
            locking: Some(true),
            ..Default::default()
        };

        base.merge(&other);
        assert_eq!(base.conflict, Some(ConflictStrategy::Fail));
        assert_eq!(base.locking, Some(true));
    }

    #[test]
    fn test_empty_lockfile_path_invalid() {
        let config = ResolutionConfig {
            lockfile: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case("latest", ConflictStrategy::Latest)]
    #[case("FAIL", ConflictStrategy::Fail)]
    fn test_conflict_from_str(#[case] input: &str, #[case] expected: ConflictStrategy) {
        assert_eq!(input.parse::<ConflictStrategy>().unwrap(), expected);
    }

    #[rstest]
    #[case("default", LockMode::Default)]
    #[case("strict", LockMode::Strict)]
    #[case("Lenient", LockMode::Lenient)]
    fn test_lock_mode_from_str(#[case] input: &str, #[case] expected: LockMode) {
        assert_eq!(input.parse::<LockMode>().unwrap(), expected);
    }

    #[test]
    fn test_lock_mode_invalid() {
        assert!("sometimes".parse::<LockMode>().is_err());
    }
}
