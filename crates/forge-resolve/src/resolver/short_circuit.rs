use super::{empty_graph, ConfigurationResolver, ModuleRepository};
use crate::artifacts::VisitedArtifactSet;
use crate::configuration::DependencyConfiguration;
use crate::error::ResolveResult;
use crate::ids::{
    ComponentIdentifierFactory, DefaultComponentIdentifierFactory, DefaultModuleIdentifierFactory,
    ModuleIdentifierFactory,
};
use crate::lenient::{LenientConfiguration, ResolvedConfiguration};
use crate::locking::LockProvider;
use crate::results::ResolverResults;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolver that answers configurations without declared dependencies with
/// empty results, and hands everything else to `delegate`.
///
/// When locking is enabled the lock state is still consulted: a configuration
/// whose lock entry pins modules that must be validated is resolved by the
/// delegate, so the lock mismatch is reported.
pub struct ShortCircuitResolver<R> {
    delegate: R,
    component_ids: Arc<dyn ComponentIdentifierFactory>,
    module_ids: Arc<dyn ModuleIdentifierFactory>,
    lock_provider: Arc<dyn LockProvider>,
}

impl<R: ConfigurationResolver> ShortCircuitResolver<R> {
    pub fn new(
        delegate: R,
        component_ids: Arc<dyn ComponentIdentifierFactory>,
        module_ids: Arc<dyn ModuleIdentifierFactory>,
        lock_provider: Arc<dyn LockProvider>,
    ) -> Self {
        Self {
            delegate,
            component_ids,
            module_ids,
            lock_provider,
        }
    }

    /// Wrap `delegate` with the default identifier factories
    pub fn with_defaults(delegate: R, lock_provider: Arc<dyn LockProvider>) -> Self {
        Self::new(
            delegate,
            Arc::new(DefaultComponentIdentifierFactory::default()),
            Arc::new(DefaultModuleIdentifierFactory),
            lock_provider,
        )
    }

    pub fn delegate(&self) -> &R {
        &self.delegate
    }

    fn empty_results(&self, configuration: &DependencyConfiguration) -> ResolverResults {
        let graph = empty_graph(configuration, &*self.module_ids, &*self.component_ids);
        let resolved = ResolvedConfiguration::new(
            graph.clone(),
            configuration.display_name(),
            LenientConfiguration::Empty,
        );
        ResolverResults::graph_resolved(graph, resolved, VisitedArtifactSet::Empty)
    }
}

impl<R: ConfigurationResolver> ConfigurationResolver for ShortCircuitResolver<R> {
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        if configuration.has_dependencies() {
            return self.delegate.resolve_build_dependencies(configuration);
        }

        debug!("No dependencies declared for {}", configuration.display_name());
        let graph = empty_graph(configuration, &*self.module_ids, &*self.component_ids);
        Ok(ResolverResults::build_dependencies_resolved(
            graph,
            VisitedArtifactSet::Empty,
        ))
    }

    fn resolve_graph(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        if configuration.has_dependencies() {
            return self.delegate.resolve_graph(configuration);
        }

        if configuration.strategy().is_dependency_locking_enabled() {
            let lock_state = self.lock_provider.load_lock_state(configuration.name())?;
            if lock_state.must_validate_lock_state()
                && !lock_state.locked_dependencies().is_empty()
            {
                warn!(
                    "{} declares no dependencies but its lock state pins {} modules, resolving fully",
                    configuration.display_name(),
                    lock_state.locked_dependencies().len()
                );
                return self.delegate.resolve_graph(configuration);
            }

            self.lock_provider.persist_resolved_dependencies(
                configuration.name(),
                &BTreeSet::new(),
                &BTreeSet::new(),
            )?;
        }

        debug!("No dependencies declared for {}", configuration.display_name());
        Ok(self.empty_results(configuration))
    }

    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>> {
        self.delegate.all_repositories()
    }
}
