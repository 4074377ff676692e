//! Query views over a resolved configuration.
//!
//! [`LenientConfiguration`] absorbs partial failure: its queries always answer
//! with whatever could be resolved. [`ResolvedConfiguration`] is the strict
//! view and refuses to answer while any failure is present.

use crate::artifacts::{
    ArtifactCollector, ArtifactSelectionSpec, ResolvedArtifact, SelectedArtifactSet,
    VisitedArtifactSet,
};
use crate::configuration::DependencySpec;
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{GraphResolutionResult, ResolutionResult, UnresolvedDependency};
use crate::ids::{ComponentIdentifier, ModuleVersionIdentifier};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use tracing::debug;

/// A resolved module and the modules it directly depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedDependency {
    pub module_version: ModuleVersionIdentifier,
    pub component: ComponentIdentifier,
    pub children: BTreeSet<ModuleVersionIdentifier>,
}

impl ResolvedDependency {
    fn from_graph(result: &ResolutionResult, id: &ComponentIdentifier) -> Option<Self> {
        let component = result.component(id)?;
        let children = result
            .dependencies_of(id)
            .filter_map(|edge| edge.selected.as_ref())
            .filter_map(|selected| result.component(selected))
            .map(|child| child.module_version.clone())
            .collect();

        Some(Self {
            module_version: component.module_version.clone(),
            component: component.id.clone(),
            children,
        })
    }
}

/// Failure-tolerant view over a graph and its artifacts
#[derive(Debug, Clone, Default)]
pub enum LenientConfiguration {
    /// Nothing to resolve: every query is empty
    #[default]
    Empty,
    Resolved {
        graph: GraphResolutionResult,
        artifacts: VisitedArtifactSet,
    },
}

impl LenientConfiguration {
    pub fn resolved(graph: GraphResolutionResult, artifacts: VisitedArtifactSet) -> Self {
        Self::Resolved { graph, artifacts }
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// All artifact types reachable through dependencies accepted by `spec`
    pub fn select(&self, spec: Option<&DependencySpec>) -> SelectedArtifactSet {
        match self {
            Self::Empty => SelectedArtifactSet::Empty,
            Self::Resolved { artifacts, .. } => {
                artifacts.select(spec, &ArtifactSelectionSpec::all())
            }
        }
    }

    /// Direct dependencies of the root whose declaration is accepted by `spec`
    pub fn first_level_module_dependencies(
        &self,
        spec: Option<&DependencySpec>,
    ) -> BTreeSet<ResolvedDependency> {
        let Self::Resolved { graph, .. } = self else {
            return BTreeSet::new();
        };

        let result = graph.resolution_result();
        let root = &result.root().id;
        result
            .dependencies_of(root)
            .filter(|edge| DependencySpec::accepts(spec, &edge.requested))
            .filter_map(|edge| edge.selected.as_ref())
            .filter_map(|selected| ResolvedDependency::from_graph(result, selected))
            .collect()
    }

    /// Transitive closure of the root's dependencies, root excluded
    pub fn all_module_dependencies(&self) -> BTreeSet<ResolvedDependency> {
        let Self::Resolved { graph, .. } = self else {
            return BTreeSet::new();
        };

        let result = graph.resolution_result();
        let root = result.root().id.clone();
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<ComponentIdentifier> = result
            .dependencies_of(&root)
            .filter_map(|edge| edge.selected.clone())
            .collect();
        let mut found = BTreeSet::new();

        while let Some(id) = queue.pop_front() {
            if id == root || !seen.insert(id.clone()) {
                continue;
            }
            if let Some(dependency) = ResolvedDependency::from_graph(result, &id) {
                found.insert(dependency);
            }
            queue.extend(
                result
                    .dependencies_of(&id)
                    .filter_map(|edge| edge.selected.clone()),
            );
        }

        found
    }

    pub fn unresolved_module_dependencies(&self) -> &[UnresolvedDependency] {
        match self {
            Self::Empty => &[],
            Self::Resolved { graph, .. } => graph.unresolved_dependencies(),
        }
    }

    /// Files of the artifacts reachable through dependencies accepted by `spec`.
    /// Artifacts that fail to resolve are skipped.
    pub fn files(&self, spec: Option<&DependencySpec>) -> BTreeSet<PathBuf> {
        self.collect(spec).files()
    }

    /// Artifacts reachable through dependencies accepted by `spec`.
    /// Artifacts that fail to resolve are skipped.
    pub fn artifacts(&self, spec: Option<&DependencySpec>) -> BTreeSet<ResolvedArtifact> {
        self.collect(spec).artifacts.into_iter().collect()
    }

    fn collect(&self, spec: Option<&DependencySpec>) -> ArtifactCollector {
        let mut collector = ArtifactCollector::new();
        self.select(spec).visit_artifacts(&mut collector, true);
        if collector.has_failures() {
            debug!(
                "Skipping {} artifacts that could not be resolved",
                collector.failures.len()
            );
        }
        collector
    }
}

/// Strict view: every query fails when the configuration has any failure
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    display_name: String,
    graph: GraphResolutionResult,
    lenient: LenientConfiguration,
}

impl ResolvedConfiguration {
    pub fn new(
        graph: GraphResolutionResult,
        display_name: impl Into<String>,
        lenient: LenientConfiguration,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            graph,
            lenient,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn has_error(&self) -> bool {
        self.graph.has_any_failure()
    }

    /// Raise the root failure, or a summary of unresolved dependencies
    pub fn rethrow_failure(&self) -> ResolveResult<()> {
        if let Some(failure) = self.graph.failure() {
            return Err(failure.clone());
        }

        let unresolved = self.graph.unresolved_dependencies();
        if !unresolved.is_empty() {
            return Err(ResolveError::UnresolvedDependencies {
                configuration: self.display_name.clone(),
                count: unresolved.len(),
                details: unresolved.iter().map(UnresolvedDependency::describe).collect(),
            });
        }

        Ok(())
    }

    pub fn lenient_configuration(&self) -> &LenientConfiguration {
        &self.lenient
    }

    pub fn first_level_module_dependencies(
        &self,
        spec: Option<&DependencySpec>,
    ) -> ResolveResult<BTreeSet<ResolvedDependency>> {
        self.rethrow_failure()?;
        Ok(self.lenient.first_level_module_dependencies(spec))
    }

    pub fn resolved_artifacts(&self) -> ResolveResult<BTreeSet<ResolvedArtifact>> {
        Ok(self.collect_strict(None)?.artifacts.into_iter().collect())
    }

    pub fn files(&self, spec: Option<&DependencySpec>) -> ResolveResult<BTreeSet<PathBuf>> {
        Ok(self.collect_strict(spec)?.files())
    }

    fn collect_strict(&self, spec: Option<&DependencySpec>) -> ResolveResult<ArtifactCollector> {
        self.rethrow_failure()?;

        let mut collector = ArtifactCollector::new();
        self.lenient.select(spec).visit_artifacts(&mut collector, true);
        if collector.has_failures() {
            return Err(ResolveError::ArtifactResolution {
                configuration: self.display_name.clone(),
                count: collector.failures.len(),
                details: collector.failures.iter().map(|f| f.to_string()).collect(),
            });
        }

        Ok(collector)
    }
}
