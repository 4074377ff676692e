//! Module metadata sources consulted by the graph resolver

use crate::artifacts::TaskPath;
use crate::attributes::AttributeContainer;
use crate::configuration::Dependency;
use crate::ids::{ModuleIdentifier, ModuleVersionIdentifier};
use semver::Version;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// An artifact published by a module version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    pub name: String,
    pub artifact_type: String,
    pub extension: String,
    pub classifier: Option<String>,
    pub attributes: AttributeContainer,
    /// `None` when the file is not available locally
    pub file: Option<PathBuf>,
    pub built_by: Option<TaskPath>,
}

impl ArtifactMetadata {
    /// An artifact whose type is its extension
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            name: name.into(),
            artifact_type: extension.clone(),
            extension,
            classifier: None,
            attributes: AttributeContainer::new(),
            file: None,
            built_by: None,
        }
    }

    pub fn with_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = artifact_type.into();
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.with(key, value);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn built_by(mut self, task: impl Into<String>) -> Self {
        self.built_by = Some(TaskPath::new(task));
        self
    }
}

/// What a repository knows about one module version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub module: ModuleIdentifier,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
    pub artifacts: Vec<ArtifactMetadata>,
    /// Changing modules may be republished under the same version
    pub changing: bool,
}

impl ModuleMetadata {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            module: ModuleIdentifier::new(group, name),
            version,
            dependencies: Vec::new(),
            artifacts: Vec::new(),
            changing: false,
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactMetadata) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn changing(mut self) -> Self {
        self.changing = true;
        self
    }

    pub fn id(&self) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier::new(
            &self.module.group,
            &self.module.name,
            self.version.to_string(),
        )
    }
}

/// A source of module versions and their metadata
pub trait ModuleRepository: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Known versions of `module`, ascending
    fn versions(&self, module: &ModuleIdentifier) -> Vec<Version>;

    fn metadata(&self, module: &ModuleIdentifier, version: &Version) -> Option<ModuleMetadata>;
}

/// Repository held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    name: String,
    modules: BTreeMap<ModuleIdentifier, BTreeMap<Version, ModuleMetadata>>,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn with_module(mut self, metadata: ModuleMetadata) -> Self {
        self.add_module(metadata);
        self
    }

    pub fn add_module(&mut self, metadata: ModuleMetadata) {
        self.modules
            .entry(metadata.module.clone())
            .or_default()
            .insert(metadata.version.clone(), metadata);
    }
}

impl ModuleRepository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn versions(&self, module: &ModuleIdentifier) -> Vec<Version> {
        self.modules
            .get(module)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn metadata(&self, module: &ModuleIdentifier, version: &Version) -> Option<ModuleMetadata> {
        self.modules.get(module)?.get(version).cloned()
    }
}
