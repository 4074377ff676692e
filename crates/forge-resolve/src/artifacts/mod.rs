//! Resolved artifacts, artifact selection and visitation

mod set;

pub use set::{ArtifactEntry, ResolvedArtifactSet, SelectedArtifactSet, VisitedArtifactSet};

use crate::attributes::AttributeContainer;
use crate::ids::{ComponentIdentifier, ModuleVersionIdentifier};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Path of a build step that produces an artifact (e.g. `:lib:jar`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskPath(String);

impl TaskPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactIdentifier {
    pub component: ComponentIdentifier,
    pub name: String,
    pub extension: String,
    pub classifier: Option<String>,
}

impl ArtifactIdentifier {
    /// File name the artifact is published under
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}.{}", self.name, classifier, self.extension),
            None => format!("{}.{}", self.name, self.extension),
        }
    }
}

impl fmt::Display for ArtifactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name(), self.component)
    }
}

/// An artifact whose file is available
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedArtifact {
    pub id: ArtifactIdentifier,
    pub module_version: ModuleVersionIdentifier,
    pub artifact_type: String,
    pub attributes: AttributeContainer,
    pub file: PathBuf,
    pub built_by: Option<TaskPath>,
}

/// An artifact that could not be materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub artifact: ArtifactIdentifier,
    pub reason: String,
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.artifact, self.reason)
    }
}

/// Narrows an artifact set by artifact type and requested attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactSelectionSpec {
    /// `None` selects every type
    types: Option<BTreeSet<String>>,
    requested: AttributeContainer,
}

impl ArtifactSelectionSpec {
    /// Every artifact type, no attribute requirements
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: Some(types.into_iter().map(Into::into).collect()),
            requested: AttributeContainer::new(),
        }
    }

    pub fn with_attributes(mut self, requested: AttributeContainer) -> Self {
        self.requested = requested;
        self
    }

    pub fn selects_all_types(&self) -> bool {
        self.types.is_none()
    }

    pub fn matches(&self, artifact_type: &str, attributes: &AttributeContainer) -> bool {
        let type_ok = self
            .types
            .as_ref()
            .map_or(true, |types| types.contains(artifact_type));
        type_ok && self.requested.is_compatible_with(attributes)
    }
}

/// Receives artifacts streamed out of a selected artifact set
pub trait ArtifactVisitor {
    fn visit_artifact(&mut self, artifact: &ResolvedArtifact);

    fn visit_failure(&mut self, failure: &ArtifactFailure);
}

/// Receives the build steps needed to produce a selection
pub trait TaskDependencyContext {
    fn add(&mut self, task: &TaskPath);
}

/// Visitor that keeps everything it is given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCollector {
    pub artifacts: Vec<ResolvedArtifact>,
    pub failures: Vec<ArtifactFailure>,
}

impl ArtifactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> BTreeSet<PathBuf> {
        self.artifacts.iter().map(|a| a.file.clone()).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl ArtifactVisitor for ArtifactCollector {
    fn visit_artifact(&mut self, artifact: &ResolvedArtifact) {
        self.artifacts.push(artifact.clone());
    }

    fn visit_failure(&mut self, failure: &ArtifactFailure) {
        self.failures.push(failure.clone());
    }
}

/// Ordered, de-duplicated set of build steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDependencySet {
    tasks: BTreeSet<TaskPath>,
}

impl TaskDependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &BTreeSet<TaskPath> {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskDependencyContext for TaskDependencySet {
    fn add(&mut self, task: &TaskPath) {
        self.tasks.insert(task.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_spec_types() {
        let attrs = AttributeContainer::new();
        assert!(ArtifactSelectionSpec::all().matches("jar", &attrs));

        let jars = ArtifactSelectionSpec::of_types(["jar"]);
        assert!(jars.matches("jar", &attrs));
        assert!(!jars.matches("pom", &attrs));
        assert!(!jars.selects_all_types());
    }

    #[test]
    fn test_selection_spec_attributes() {
        let spec = ArtifactSelectionSpec::all()
            .with_attributes([("usage", "runtime")].into_iter().collect());
        let runtime: AttributeContainer = [("usage", "runtime")].into_iter().collect();
        let api: AttributeContainer = [("usage", "api")].into_iter().collect();

        assert!(spec.matches("jar", &runtime));
        assert!(!spec.matches("jar", &api));
    }

    #[test]
    fn test_artifact_file_name() {
        let id = ArtifactIdentifier {
            component: ComponentIdentifier::Module(ModuleVersionIdentifier::new(
                "g", "core", "1.0.0",
            )),
            name: "core".to_string(),
            extension: "jar".to_string(),
            classifier: Some("sources".to_string()),
        };
        assert_eq!(id.file_name(), "core-sources.jar");
        assert_eq!(id.to_string(), "core-sources.jar (g:core:1.0.0)");
    }

    #[test]
    fn test_task_dependency_set_dedups() {
        let mut tasks = TaskDependencySet::new();
        tasks.add(&TaskPath::new(":lib:jar"));
        tasks.add(&TaskPath::new(":lib:jar"));
        assert_eq!(tasks.tasks().len(), 1);
    }
}
