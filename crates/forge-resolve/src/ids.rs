//! Module and component identifiers, and the factories that create them

use crate::configuration::Module;
use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Module coordinates without a version (`group:name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

impl ModuleIdentifier {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// Versioned module coordinates (`group:name:version`)
///
/// Serialized as its string form, which is also the lockfile representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleVersionIdentifier {
    pub module: ModuleIdentifier,
    pub version: String,
}

impl ModuleVersionIdentifier {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            module: ModuleIdentifier::new(group, name),
            version: version.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.module.group
    }

    pub fn name(&self) -> &str {
        &self.module.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

impl FromStr for ModuleVersionIdentifier {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version] if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(ResolveError::invalid_dependency(
                s,
                "expected 'group:name:version'",
            )),
        }
    }
}

impl TryFrom<String> for ModuleVersionIdentifier {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleVersionIdentifier> for String {
    fn from(id: ModuleVersionIdentifier) -> Self {
        id.to_string()
    }
}

/// Identity of the build that owns project components
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildIdentifier {
    pub name: String,
}

impl BuildIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The root build
    pub fn root() -> Self {
        Self::new(":")
    }
}

impl Default for BuildIdentifier {
    fn default() -> Self {
        Self::root()
    }
}

/// Identity of a node in a resolution graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentIdentifier {
    /// A project of some build
    Project { build: BuildIdentifier, path: String },
    /// An external module version
    Module(ModuleVersionIdentifier),
}

impl ComponentIdentifier {
    pub fn is_project(&self) -> bool {
        matches!(self, Self::Project { .. })
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { build, path } if build.name == ":" => write!(f, "project {}", path),
            Self::Project { build, path } => write!(f, "project {}{}", build.name, path),
            Self::Module(id) => write!(f, "{}", id),
        }
    }
}

/// Creates module identifiers
pub trait ModuleIdentifierFactory: Send + Sync {
    fn module_with_version(&self, group: &str, name: &str, version: &str)
        -> ModuleVersionIdentifier;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModuleIdentifierFactory;

impl ModuleIdentifierFactory for DefaultModuleIdentifierFactory {
    fn module_with_version(
        &self,
        group: &str,
        name: &str,
        version: &str,
    ) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier::new(group, name, version)
    }
}

/// Creates the component identifier for an owning module
pub trait ComponentIdentifierFactory: Send + Sync {
    fn create_component_identifier(&self, module: &Module) -> ComponentIdentifier;
}

/// Project modules become project components of `build`; everything else a module component
#[derive(Debug, Clone, Default)]
pub struct DefaultComponentIdentifierFactory {
    build: BuildIdentifier,
}

impl DefaultComponentIdentifierFactory {
    pub fn new(build: BuildIdentifier) -> Self {
        Self { build }
    }
}

impl ComponentIdentifierFactory for DefaultComponentIdentifierFactory {
    fn create_component_identifier(&self, module: &Module) -> ComponentIdentifier {
        match &module.project_path {
            Some(path) => ComponentIdentifier::Project {
                build: self.build.clone(),
                path: path.clone(),
            },
            None => ComponentIdentifier::Module(ModuleVersionIdentifier::new(
                &module.group,
                &module.name,
                &module.version,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_version() {
        let id: ModuleVersionIdentifier = "org.example:core:1.2.0".parse().unwrap();
        assert_eq!(id.group(), "org.example");
        assert_eq!(id.name(), "core");
        assert_eq!(id.version(), "1.2.0");
        assert_eq!(id.to_string(), "org.example:core:1.2.0");
    }

    #[test]
    fn test_parse_module_version_invalid() {
        assert!("org.example:core".parse::<ModuleVersionIdentifier>().is_err());
        assert!("a:b:c:d".parse::<ModuleVersionIdentifier>().is_err());
    }

    #[test]
    fn test_project_component_for_project_module() {
        let factory = DefaultComponentIdentifierFactory::new(BuildIdentifier::root());
        let module = Module::new("org.example", "app", "1.0").with_project_path(":app");

        let id = factory.create_component_identifier(&module);
        assert!(id.is_project());
        assert_eq!(id.to_string(), "project :app");
    }

    #[test]
    fn test_module_component_for_detached_module() {
        let factory = DefaultComponentIdentifierFactory::default();
        let module = Module::new("org.example", "app", "1.0");

        let id = factory.create_component_identifier(&module);
        assert_eq!(
            id,
            ComponentIdentifier::Module(ModuleVersionIdentifier::new("org.example", "app", "1.0"))
        );
    }
}
