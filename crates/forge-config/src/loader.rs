//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{ConfigurationSection, ProjectConfig};
use crate::resolution::{ResolutionConfig, ResolutionSettings};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "forge.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.forge/config.toml) - lowest priority
/// 2. Project config (./forge.toml) - overrides global
/// 3. Environment variables (FORGE_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration (environment overrides already applied)
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where forge.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.forge/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find forge.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;
        let project_config = apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                debug!("Using project configuration {}", config_path.display());
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    debug!(
                        "No {} found above {}, using defaults",
                        PROJECT_CONFIG_FILE,
                        start_dir.display()
                    );
                    return Ok((None, ProjectConfig::default()));
                }
            }
        }
    }

    /// Load global configuration, which is optional
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            trace!("No global configuration at {}", path.display());
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.forge)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".forge"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides to the project's resolution table
///
/// Recognised variables: FORGE_LOCKING, FORGE_WRITE_LOCKS, FORGE_LOCK_MODE, FORGE_CONFLICT
fn apply_env_overrides(mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
    let mut overrides = ResolutionConfig::default();

    if let Ok(locking) = env::var("FORGE_LOCKING") {
        overrides.locking = Some(parse_bool(&locking));
    }
    if let Ok(write_locks) = env::var("FORGE_WRITE_LOCKS") {
        overrides.write_locks = Some(parse_bool(&write_locks));
    }
    if let Ok(mode) = env::var("FORGE_LOCK_MODE") {
        overrides.lock_mode = Some(mode.parse().map_err(|_| ConfigError::InvalidValue {
            field: "FORGE_LOCK_MODE".to_string(),
            reason: format!("unknown lock mode '{}'", mode),
        })?);
    }
    if let Ok(conflict) = env::var("FORGE_CONFLICT") {
        overrides.conflict = Some(conflict.parse().map_err(|_| ConfigError::InvalidValue {
            field: "FORGE_CONFLICT".to_string(),
            reason: format!("unknown conflict strategy '{}'", conflict),
        })?);
    }

    if overrides != ResolutionConfig::default() {
        debug!("Applying environment overrides: {:?}", overrides);
        config
            .resolution
            .get_or_insert_with(ResolutionConfig::default)
            .merge(&overrides);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Effective resolution settings (env > project > global > defaults)
    pub fn effective_resolution(&self) -> ResolutionSettings {
        let mut merged = self.global.resolution.clone().unwrap_or_default();
        if let Some(project) = &self.project.resolution {
            merged.merge(project);
        }
        merged.settings()
    }

    /// Lockfile location, resolved against the project root when relative
    pub fn lockfile_path(&self) -> PathBuf {
        let lockfile = self.effective_resolution().lockfile;
        match &self.project_root {
            Some(root) if lockfile.is_relative() => root.join(lockfile),
            _ => lockfile,
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Get the project name
    pub fn project_name(&self) -> Option<&str> {
        self.project.project_name()
    }

    /// Look up a declared configuration
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationSection> {
        self.project.configuration(name)
    }

    /// Names of all declared configurations, in order
    pub fn configuration_names(&self) -> impl Iterator<Item = &str> {
        self.project.configurations.keys().map(String::as_str)
    }

    /// Check if this is a project (has forge.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
