//! Configuration resolvers: the two-phase resolution contract and its implementations

pub mod conflict;
mod default;
pub mod repository;
mod short_circuit;
mod version_solver;

pub use conflict::{Conflict, VersionConstraint};
pub use default::DefaultConfigurationResolver;
pub use repository::{ArtifactMetadata, InMemoryRepository, ModuleMetadata, ModuleRepository};
pub use short_circuit::ShortCircuitResolver;
pub use version_solver::{VersionSelection, VersionSolver};

use crate::configuration::DependencyConfiguration;
use crate::error::ResolveResult;
use crate::graph::{GraphResolutionResult, ResolutionResult};
use crate::ids::{ComponentIdentifier, ComponentIdentifierFactory, ModuleIdentifierFactory, ModuleVersionIdentifier};
use crate::results::ResolverResults;
use std::sync::Arc;

/// Resolves configurations in two phases
pub trait ConfigurationResolver: Send + Sync {
    /// Resolve just enough to know which build steps must run first
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults>;

    /// Resolve the full graph and its artifacts
    fn resolve_graph(&self, configuration: &DependencyConfiguration)
        -> ResolveResult<ResolverResults>;

    /// Repositories consulted, in search order
    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>>;
}

impl<R: ConfigurationResolver + ?Sized> ConfigurationResolver for Box<R> {
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        (**self).resolve_build_dependencies(configuration)
    }

    fn resolve_graph(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        (**self).resolve_graph(configuration)
    }

    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>> {
        (**self).all_repositories()
    }
}

impl<R: ConfigurationResolver + ?Sized> ConfigurationResolver for Arc<R> {
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        (**self).resolve_build_dependencies(configuration)
    }

    fn resolve_graph(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        (**self).resolve_graph(configuration)
    }

    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>> {
        (**self).all_repositories()
    }
}

/// Identity of the module owning `configuration`, as a graph root
pub(crate) fn root_identity(
    configuration: &DependencyConfiguration,
    module_ids: &dyn ModuleIdentifierFactory,
    component_ids: &dyn ComponentIdentifierFactory,
) -> (ModuleVersionIdentifier, ComponentIdentifier) {
    let module = configuration.module();
    let id = module_ids.module_with_version(&module.group, &module.name, &module.version);
    let component = component_ids.create_component_identifier(module);
    (id, component)
}

/// Root-only graph: no edges, no unresolved dependencies, no failure
pub(crate) fn empty_graph(
    configuration: &DependencyConfiguration,
    module_ids: &dyn ModuleIdentifierFactory,
    component_ids: &dyn ComponentIdentifierFactory,
) -> GraphResolutionResult {
    let (id, component) = root_identity(configuration, module_ids, component_ids);
    let result = ResolutionResult::empty(id, component, configuration.attributes().as_immutable());
    GraphResolutionResult::new(result, Vec::new(), None)
}
