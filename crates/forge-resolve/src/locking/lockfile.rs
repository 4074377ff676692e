//! Lockfile (forge.lock) recording what each configuration resolved to

use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleVersionIdentifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Lockfile structure (forge.lock)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lockfile {
    /// Lockfile format version
    pub version: u32,
    /// Configurations that resolved to nothing
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub empty: BTreeSet<String>,
    /// Locked modules, per configuration
    #[serde(default)]
    pub configurations: BTreeMap<String, LockedConfiguration>,
    #[serde(default)]
    pub metadata: LockfileMetadata,
}

/// Lock entry of one configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LockedConfiguration {
    /// Pinned module versions
    #[serde(default)]
    pub modules: BTreeSet<ModuleVersionIdentifier>,
    /// Modules recorded without being pinned
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub changing: BTreeSet<ModuleVersionIdentifier>,
}

impl LockedConfiguration {
    fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.changing.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LockfileMetadata {
    /// When the lockfile was last written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forge_version: Option<String>,
}

impl Lockfile {
    /// Current lockfile format version
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            empty: BTreeSet::new(),
            configurations: BTreeMap::new(),
            metadata: LockfileMetadata::default(),
        }
    }

    /// Parse lockfile from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load and verify a lockfile
    pub fn from_file(path: &Path) -> ResolveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ResolveError::lockfile(path, e))?;
        let lockfile = Self::from_str(&content).map_err(|e| ResolveError::lockfile(path, e))?;
        lockfile
            .verify()
            .map_err(|reason| ResolveError::lockfile(path, reason))?;
        Ok(lockfile)
    }

    /// Serialize to TOML string
    pub fn to_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write lockfile to file, stamping generation metadata
    pub fn write_to_file(&mut self, path: &Path) -> ResolveResult<()> {
        self.metadata.forge_version = Some(env!("CARGO_PKG_VERSION").to_string());
        self.metadata.generated_at =
            Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));

        let content = self.to_string().map_err(|e| ResolveError::lockfile(path, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ResolveError::lockfile(path, e))?;
        }
        std::fs::write(path, content).map_err(|e| ResolveError::lockfile(path, e))?;
        Ok(())
    }

    /// Pinned modules of a configuration, if one was recorded
    pub fn entry(&self, configuration: &str) -> Option<BTreeSet<ModuleVersionIdentifier>> {
        if self.empty.contains(configuration) {
            return Some(BTreeSet::new());
        }
        self.configurations
            .get(configuration)
            .map(|locked| locked.modules.clone())
    }

    /// Record a configuration's entry; returns whether anything changed
    pub fn set_entry(
        &mut self,
        configuration: &str,
        modules: &BTreeSet<ModuleVersionIdentifier>,
        changing: &BTreeSet<ModuleVersionIdentifier>,
    ) -> bool {
        let locked = LockedConfiguration {
            modules: modules.clone(),
            changing: changing.clone(),
        };

        if locked.is_empty() {
            let removed = self.configurations.remove(configuration).is_some();
            let added = self.empty.insert(configuration.to_string());
            return removed || added;
        }

        let was_empty = self.empty.remove(configuration);
        let previous = self.configurations.insert(configuration.to_string(), locked.clone());
        was_empty || previous.as_ref() != Some(&locked)
    }

    /// Remove a configuration's entry
    pub fn remove(&mut self, configuration: &str) -> bool {
        let was_empty = self.empty.remove(configuration);
        self.configurations.remove(configuration).is_some() || was_empty
    }

    /// Verify lockfile integrity
    pub fn verify(&self) -> Result<(), String> {
        if self.version > Self::VERSION {
            return Err(format!(
                "Lockfile version {} is newer than supported version {}",
                self.version,
                Self::VERSION
            ));
        }

        if let Some(name) = self
            .empty
            .iter()
            .find(|name| self.configurations.contains_key(*name))
        {
            return Err(format!(
                "Configuration '{}' is listed as empty and has locked modules",
                name
            ));
        }

        for (name, locked) in &self.configurations {
            let mut seen = BTreeSet::new();
            for module in &locked.modules {
                if !seen.insert(&module.module) {
                    return Err(format!(
                        "Duplicate module {} in configuration '{}'",
                        module.module, name
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mvi(s: &str) -> ModuleVersionIdentifier {
        s.parse().unwrap()
    }

    #[test]
    fn test_create_empty_lockfile() {
        let lockfile = Lockfile::new();
        assert_eq!(lockfile.version, Lockfile::VERSION);
        assert!(lockfile.configurations.is_empty());
        assert_eq!(lockfile.entry("runtime"), None);
    }

    #[test]
    fn test_set_entry_reports_changes() {
        let mut lockfile = Lockfile::new();
        let modules = BTreeSet::from([mvi("org.example:core:1.2.0")]);

        assert!(lockfile.set_entry("runtime", &modules, &BTreeSet::new()));
        assert!(!lockfile.set_entry("runtime", &modules, &BTreeSet::new()));
        assert_eq!(lockfile.entry("runtime"), Some(modules));
    }

    #[test]
    fn test_empty_entry_moves_to_empty_list() {
        let mut lockfile = Lockfile::new();
        let modules = BTreeSet::from([mvi("org.example:core:1.2.0")]);
        lockfile.set_entry("runtime", &modules, &BTreeSet::new());

        assert!(lockfile.set_entry("runtime", &BTreeSet::new(), &BTreeSet::new()));
        assert!(!lockfile.set_entry("runtime", &BTreeSet::new(), &BTreeSet::new()));
        assert!(lockfile.configurations.is_empty());
        assert_eq!(lockfile.entry("runtime"), Some(BTreeSet::new()));
        assert!(lockfile.remove("runtime"));
        assert_eq!(lockfile.entry("runtime"), None);
    }

    #[test]
    fn test_serialize_lockfile() {
        let mut lockfile = Lockfile::new();
        lockfile.set_entry(
            "compile",
            &BTreeSet::from([mvi("org.example:core:1.2.0")]),
            &BTreeSet::from([mvi("org.example:snapshot:0.1.0")]),
        );
        lockfile.set_entry("runtime", &BTreeSet::new(), &BTreeSet::new());

        let toml = lockfile.to_string().unwrap();
        assert!(toml.contains("version = 1"));
        assert!(toml.contains("[configurations.compile]"));
        assert!(toml.contains("\"org.example:core:1.2.0\""));
        assert!(toml.contains("\"runtime\""));

        assert_eq!(Lockfile::from_str(&toml).unwrap(), lockfile);
    }

    #[test]
    fn test_parse_lockfile() {
        let toml = r#"
            version = 1
            empty = ["annotationProcessor"]

            [configurations.runtime]
            modules = ["org.example:core:1.0.0", "org.example:util:2.1.0"]
        "#;

        let lockfile = Lockfile::from_str(toml).unwrap();
        assert_eq!(lockfile.entry("runtime").map(|m| m.len()), Some(2));
        assert_eq!(lockfile.entry("annotationProcessor"), Some(BTreeSet::new()));
        assert!(lockfile.verify().is_ok());
    }

    #[test]
    fn test_verify_rejects_newer_version() {
        let mut lockfile = Lockfile::new();
        lockfile.version = Lockfile::VERSION + 1;
        assert!(lockfile.verify().is_err());
    }

    #[test]
    fn test_verify_duplicate_modules() {
        let mut lockfile = Lockfile::new();
        lockfile.configurations.insert(
            "runtime".to_string(),
            LockedConfiguration {
                modules: BTreeSet::from([mvi("g:core:1.0.0"), mvi("g:core:2.0.0")]),
                changing: BTreeSet::new(),
            },
        );
        assert!(lockfile.verify().is_err());
    }

    #[test]
    fn test_invalid_module_notation_fails_to_parse() {
        let toml = r#"
            version = 1

            [configurations.runtime]
            modules = ["not-a-module"]
        "#;
        assert!(Lockfile::from_str(toml).is_err());
    }
}
