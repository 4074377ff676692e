use super::{
    ArtifactFailure, ArtifactIdentifier, ArtifactSelectionSpec, ArtifactVisitor, ResolvedArtifact,
    TaskDependencyContext, TaskPath,
};
use crate::attributes::AttributeContainer;
use crate::configuration::{Dependency, DependencySpec};
use crate::ids::ModuleVersionIdentifier;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// One artifact of a resolved graph, before materialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub id: ArtifactIdentifier,
    pub module_version: ModuleVersionIdentifier,
    pub artifact_type: String,
    pub attributes: AttributeContainer,
    /// `None` when no file is available for the artifact
    pub file: Option<PathBuf>,
    pub built_by: Option<TaskPath>,
    /// Indices of the first-level dependencies this artifact is reachable through
    pub reachable_from: BTreeSet<usize>,
}

impl ArtifactEntry {
    fn materialize(&self) -> Result<ResolvedArtifact, ArtifactFailure> {
        match &self.file {
            Some(file) => Ok(ResolvedArtifact {
                id: self.id.clone(),
                module_version: self.module_version.clone(),
                artifact_type: self.artifact_type.clone(),
                attributes: self.attributes.clone(),
                file: file.clone(),
                built_by: self.built_by.clone(),
            }),
            None => Err(ArtifactFailure {
                artifact: self.id.clone(),
                reason: "no file available for artifact".to_string(),
            }),
        }
    }
}

/// Artifacts of a resolved graph, keyed back to the first-level dependencies
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedArtifactSet {
    first_level: Vec<Dependency>,
    entries: Vec<ArtifactEntry>,
}

impl ResolvedArtifactSet {
    pub fn new(first_level: Vec<Dependency>, entries: Vec<ArtifactEntry>) -> Self {
        Self {
            first_level,
            entries,
        }
    }

    pub fn entries(&self) -> &[ArtifactEntry] {
        &self.entries
    }

    fn matching<'a>(
        &'a self,
        dependency_spec: Option<&'a DependencySpec>,
        selection: &'a ArtifactSelectionSpec,
    ) -> impl Iterator<Item = &'a ArtifactEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            selection.matches(&entry.artifact_type, &entry.attributes)
                && entry.reachable_from.iter().any(|&index| {
                    self.first_level
                        .get(index)
                        .is_some_and(|dep| DependencySpec::accepts(dependency_spec, dep))
                })
        })
    }
}

/// Artifact set produced by graph resolution, not yet narrowed
#[derive(Debug, Clone, Default)]
pub enum VisitedArtifactSet {
    /// Nothing was resolved
    #[default]
    Empty,
    Resolved(Arc<ResolvedArtifactSet>),
}

impl VisitedArtifactSet {
    pub fn resolved(set: ResolvedArtifactSet) -> Self {
        Self::Resolved(Arc::new(set))
    }

    /// Narrow to the artifacts reachable through dependencies accepted by
    /// `dependency_spec` (all when `None`) and matching `selection`.
    /// No traversal happens until the selection is visited.
    pub fn select(
        &self,
        dependency_spec: Option<&DependencySpec>,
        selection: &ArtifactSelectionSpec,
    ) -> SelectedArtifactSet {
        match self {
            Self::Empty => SelectedArtifactSet::Empty,
            Self::Resolved(set) => SelectedArtifactSet::Selected {
                source: Arc::clone(set),
                dependency_spec: dependency_spec.cloned(),
                selection: selection.clone(),
            },
        }
    }

    /// True for the shared empty result
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Artifact set narrowed by dependency and artifact filters
#[derive(Debug, Clone, Default)]
pub enum SelectedArtifactSet {
    #[default]
    Empty,
    Selected {
        source: Arc<ResolvedArtifactSet>,
        dependency_spec: Option<DependencySpec>,
        selection: ArtifactSelectionSpec,
    },
}

impl SelectedArtifactSet {
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Report the build steps that produce the selected artifacts
    pub fn visit_dependencies(&self, context: &mut dyn TaskDependencyContext) {
        let Self::Selected {
            source,
            dependency_spec,
            selection,
        } = self
        else {
            return;
        };

        for entry in source.matching(dependency_spec.as_ref(), selection) {
            if let Some(task) = &entry.built_by {
                context.add(task);
            }
        }
    }

    /// Stream selected artifacts to `visitor`.
    ///
    /// A failed artifact is always reported. With `continue_on_selection_failure`
    /// unset, visitation stops after the first failure.
    pub fn visit_artifacts(
        &self,
        visitor: &mut dyn ArtifactVisitor,
        continue_on_selection_failure: bool,
    ) {
        let Self::Selected {
            source,
            dependency_spec,
            selection,
        } = self
        else {
            return;
        };

        for entry in source.matching(dependency_spec.as_ref(), selection) {
            match entry.materialize() {
                Ok(artifact) => visitor.visit_artifact(&artifact),
                Err(failure) => {
                    trace!("Artifact failure: {}", failure);
                    visitor.visit_failure(&failure);
                    if !continue_on_selection_failure {
                        return;
                    }
                }
            }
        }
    }
}
