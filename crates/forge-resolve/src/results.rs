//! Resolver results, in the two phases they are produced

use crate::artifacts::VisitedArtifactSet;
use crate::graph::GraphResolutionResult;
use crate::lenient::ResolvedConfiguration;
use std::fmt;

/// How far a configuration has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    /// Only enough to know which build steps must run first
    BuildDependencies,
    /// Full graph, ready for queries
    Graph,
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildDependencies => write!(f, "build dependencies"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// Output of a resolver phase
#[derive(Debug, Clone)]
pub enum ResolverResults {
    BuildDependenciesResolved {
        graph: GraphResolutionResult,
        artifacts: VisitedArtifactSet,
    },
    GraphResolved {
        graph: GraphResolutionResult,
        configuration: ResolvedConfiguration,
        artifacts: VisitedArtifactSet,
    },
}

impl ResolverResults {
    pub fn build_dependencies_resolved(
        graph: GraphResolutionResult,
        artifacts: VisitedArtifactSet,
    ) -> Self {
        Self::BuildDependenciesResolved { graph, artifacts }
    }

    pub fn graph_resolved(
        graph: GraphResolutionResult,
        configuration: ResolvedConfiguration,
        artifacts: VisitedArtifactSet,
    ) -> Self {
        Self::GraphResolved {
            graph,
            configuration,
            artifacts,
        }
    }

    pub fn phase(&self) -> ResolutionPhase {
        match self {
            Self::BuildDependenciesResolved { .. } => ResolutionPhase::BuildDependencies,
            Self::GraphResolved { .. } => ResolutionPhase::Graph,
        }
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.phase() == ResolutionPhase::Graph
    }

    pub fn graph(&self) -> &GraphResolutionResult {
        match self {
            Self::BuildDependenciesResolved { graph, .. } | Self::GraphResolved { graph, .. } => {
                graph
            }
        }
    }

    pub fn visited_artifacts(&self) -> &VisitedArtifactSet {
        match self {
            Self::BuildDependenciesResolved { artifacts, .. }
            | Self::GraphResolved { artifacts, .. } => artifacts,
        }
    }

    /// The strict view, once the graph phase has run
    pub fn resolved_configuration(&self) -> Option<&ResolvedConfiguration> {
        match self {
            Self::GraphResolved { configuration, .. } => Some(configuration),
            Self::BuildDependenciesResolved { .. } => None,
        }
    }
}
