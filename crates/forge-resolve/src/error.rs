//! Resolution error types
use std::path::PathBuf;
use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised or recorded while resolving a configuration.
///
/// Errors are `Clone` so that a graph result can carry its root failure, and
/// each unresolved dependency its cause, as plain data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Could not resolve all dependencies for {configuration}: {reason}")]
    ResolutionFailed {
        configuration: String,
        reason: String,
    },

    #[error("{0}")]
    VersionConflict(String),

    #[error("Dependency lock state for {configuration} is out of date:\n{}", details.join("\n"))]
    LockOutOfDate {
        configuration: String,
        details: Vec<String>,
    },

    #[error("Dependency lock state for {0} is missing (strict lock mode)")]
    MissingLockState(String),

    #[error("Could not find {module}. Searched in: {searched}")]
    ModuleNotFound { module: String, searched: String },

    #[error("No version of {module} matches {requirements}")]
    NoMatchingVersion {
        module: String,
        requirements: String,
    },

    #[error("Invalid dependency notation '{notation}': {reason}")]
    InvalidDependency { notation: String, reason: String },

    #[error("Unknown configuration '{0}'")]
    UnknownConfiguration(String),

    #[error("Could not resolve {count} dependencies of {configuration}:\n{}", details.join("\n"))]
    UnresolvedDependencies {
        configuration: String,
        count: usize,
        details: Vec<String>,
    },

    #[error("Could not resolve {count} artifacts of {configuration}:\n{}", details.join("\n"))]
    ArtifactResolution {
        configuration: String,
        count: usize,
        details: Vec<String>,
    },

    #[error("Lockfile error at {path}: {reason}")]
    Lockfile { path: PathBuf, reason: String },

    #[error("Lock store error: {0}")]
    LockStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ResolveError {
    /// Create a whole-configuration resolution failure
    pub fn resolution_failed(configuration: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResolutionFailed {
            configuration: configuration.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid notation error
    pub fn invalid_dependency(notation: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidDependency {
            notation: notation.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a lockfile error with path context
    pub fn lockfile(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Lockfile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<forge_config::ConfigError> for ResolveError {
    fn from(error: forge_config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}
