use super::conflict::{Conflict, VersionConstraint};
use super::repository::{ModuleMetadata, ModuleRepository};
use super::version_solver::{VersionSelection, VersionSolver};
use super::{root_identity, ConfigurationResolver};
use crate::artifacts::{
    ArtifactEntry, ArtifactIdentifier, ResolvedArtifactSet, VisitedArtifactSet,
};
use crate::configuration::{Dependency, DependencyConfiguration};
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{
    DependencyEdge, GraphResolutionResult, ResolutionResult, ResolvedComponent,
    UnresolvedDependency,
};
use crate::ids::{
    ComponentIdentifier, ComponentIdentifierFactory, DefaultComponentIdentifierFactory,
    DefaultModuleIdentifierFactory, ModuleIdentifier, ModuleIdentifierFactory,
    ModuleVersionIdentifier,
};
use crate::lenient::{LenientConfiguration, ResolvedConfiguration};
use crate::locking::{LockProvider, LockState};
use crate::results::ResolverResults;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on version selection passes before giving up
const MAX_PASSES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice {
    Selected(ModuleMetadata),
    Failed(ResolveError),
}

/// Everything a graph walk produces
struct Walk {
    result: ResolutionResult,
    unresolved: Vec<UnresolvedDependency>,
    failure: Option<ResolveError>,
    artifacts: VisitedArtifactSet,
    selected: BTreeMap<ModuleIdentifier, ModuleMetadata>,
}

impl Walk {
    fn into_graph(
        self,
        failure: Option<ResolveError>,
    ) -> (GraphResolutionResult, VisitedArtifactSet) {
        (
            GraphResolutionResult::new(self.result, self.unresolved, failure),
            self.artifacts,
        )
    }
}

/// Graph resolver over a list of module repositories.
///
/// Versions are selected breadth-first from the root until selection stops
/// changing. Modules that cannot be found, or have no matching version, are
/// reported as unresolved dependencies rather than raised.
pub struct DefaultConfigurationResolver {
    repositories: Vec<Arc<dyn ModuleRepository>>,
    component_ids: Arc<dyn ComponentIdentifierFactory>,
    module_ids: Arc<dyn ModuleIdentifierFactory>,
    lock_provider: Arc<dyn LockProvider>,
}

impl DefaultConfigurationResolver {
    pub fn new(
        repositories: Vec<Arc<dyn ModuleRepository>>,
        lock_provider: Arc<dyn LockProvider>,
    ) -> Self {
        Self {
            repositories,
            component_ids: Arc::new(DefaultComponentIdentifierFactory::default()),
            module_ids: Arc::new(DefaultModuleIdentifierFactory),
            lock_provider,
        }
    }

    pub fn with_identifier_factories(
        mut self,
        component_ids: Arc<dyn ComponentIdentifierFactory>,
        module_ids: Arc<dyn ModuleIdentifierFactory>,
    ) -> Self {
        self.component_ids = component_ids;
        self.module_ids = module_ids;
        self
    }

    fn repository_names(&self) -> String {
        if self.repositories.is_empty() {
            return "(no repositories)".to_string();
        }
        self.repositories
            .iter()
            .map(|repo| repo.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn walk(
        &self,
        configuration: &DependencyConfiguration,
        pins: &BTreeMap<ModuleIdentifier, Version>,
    ) -> Walk {
        let display_name = configuration.display_name();
        let solver = VersionSolver::new(configuration.strategy().conflict);
        let (root_id, root_component) =
            root_identity(configuration, &*self.module_ids, &*self.component_ids);

        let mut choices = BTreeMap::new();
        let mut conflicts = BTreeMap::new();
        let mut settled = false;

        for pass in 0..MAX_PASSES {
            let constraints = collect_constraints(configuration, &root_component, &choices);
            let mut next = BTreeMap::new();
            let mut next_conflicts = BTreeMap::new();
            for (module, module_constraints) in &constraints {
                let choice = self.choose(
                    &solver,
                    module,
                    module_constraints,
                    pins.get(module),
                    &mut next_conflicts,
                );
                next.insert(module.clone(), choice);
            }

            if next == choices {
                debug!("Version selection for {} settled after {} passes", display_name, pass);
                settled = true;
                break;
            }
            choices = next;
            conflicts = next_conflicts;
        }

        let mut result = ResolutionResult::empty(
            root_id,
            root_component.clone(),
            configuration.attributes().as_immutable(),
        );
        let mut unresolved = Vec::new();
        let mut selected = BTreeMap::new();
        let mut queue: VecDeque<(ComponentIdentifier, &Dependency)> = configuration
            .dependencies()
            .iter()
            .map(|dep| (root_component.clone(), dep))
            .collect();

        while let Some((from, dep)) = queue.pop_front() {
            match choices.get(&dep.module) {
                Some(Choice::Selected(metadata)) => {
                    let id = ComponentIdentifier::Module(metadata.id());
                    result.add_edge(DependencyEdge {
                        from,
                        requested: dep.clone(),
                        selected: Some(id.clone()),
                    });
                    if !selected.contains_key(&dep.module) {
                        selected.insert(dep.module.clone(), metadata.clone());
                        result.add_component(ResolvedComponent {
                            id: id.clone(),
                            module_version: metadata.id(),
                        });
                        queue.extend(metadata.dependencies.iter().map(|d| (id.clone(), d)));
                    }
                }
                choice => {
                    let failure = match choice {
                        Some(Choice::Failed(failure)) => failure.clone(),
                        _ => ResolveError::resolution_failed(
                            &display_name,
                            format!("no version was selected for {}", dep.module),
                        ),
                    };
                    result.add_edge(DependencyEdge {
                        from: from.clone(),
                        requested: dep.clone(),
                        selected: None,
                    });
                    unresolved.push(UnresolvedDependency {
                        requested: dep.clone(),
                        from,
                        failure,
                    });
                }
            }
        }

        let failure = if !settled {
            Some(ResolveError::resolution_failed(
                &display_name,
                format!("version selection did not settle after {} passes", MAX_PASSES),
            ))
        } else if !conflicts.is_empty() {
            Some(ResolveError::VersionConflict(
                conflicts
                    .values()
                    .map(Conflict::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        } else {
            None
        };

        let artifacts = collect_artifacts(configuration, &result, &selected);

        Walk {
            result,
            unresolved,
            failure,
            artifacts,
            selected,
        }
    }

    fn choose(
        &self,
        solver: &VersionSolver,
        module: &ModuleIdentifier,
        constraints: &[VersionConstraint],
        pin: Option<&Version>,
        conflicts: &mut BTreeMap<ModuleIdentifier, Conflict>,
    ) -> Choice {
        let Some((repository, available)) = self
            .repositories
            .iter()
            .map(|repo| (repo, repo.versions(module)))
            .find(|(_, versions)| !versions.is_empty())
        else {
            return Choice::Failed(ResolveError::ModuleNotFound {
                module: module.to_string(),
                searched: self.repository_names(),
            });
        };

        let version = match solver.select(module, &available, constraints, pin) {
            VersionSelection::Selected(version) => version,
            VersionSelection::Conflicting { fallback, conflict } => {
                conflicts.insert(module.clone(), conflict);
                fallback
            }
            VersionSelection::NoMatch => {
                return Choice::Failed(ResolveError::NoMatchingVersion {
                    module: module.to_string(),
                    requirements: constraints
                        .iter()
                        .map(|c| c.requirement.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };

        match repository.metadata(module, &version) {
            Some(metadata) => Choice::Selected(metadata),
            None => Choice::Failed(ResolveError::ModuleNotFound {
                module: format!("{}:{}", module, version),
                searched: repository.name().to_string(),
            }),
        }
    }
}

/// Requirements on every module reachable through the current choices
fn collect_constraints<'a>(
    configuration: &'a DependencyConfiguration,
    root: &ComponentIdentifier,
    choices: &'a BTreeMap<ModuleIdentifier, Choice>,
) -> BTreeMap<ModuleIdentifier, Vec<VersionConstraint>> {
    let mut constraints: BTreeMap<ModuleIdentifier, Vec<VersionConstraint>> = BTreeMap::new();
    let mut expanded = BTreeSet::new();
    let mut queue: VecDeque<(String, &'a Dependency)> = configuration
        .dependencies()
        .iter()
        .map(|dep| (root.to_string(), dep))
        .collect();

    while let Some((source, dep)) = queue.pop_front() {
        constraints
            .entry(dep.module.clone())
            .or_default()
            .push(VersionConstraint::new(dep.requirement.clone(), source));

        if !expanded.insert(dep.module.clone()) {
            continue;
        }
        if let Some(Choice::Selected(metadata)) = choices.get(&dep.module) {
            let source = metadata.id().to_string();
            queue.extend(metadata.dependencies.iter().map(|d| (source.clone(), d)));
        }
    }

    constraints
}

/// Artifacts of every selected module, tagged with the first-level
/// dependencies they are reachable through
fn collect_artifacts(
    configuration: &DependencyConfiguration,
    result: &ResolutionResult,
    selected: &BTreeMap<ModuleIdentifier, ModuleMetadata>,
) -> VisitedArtifactSet {
    let mut entries: BTreeMap<ArtifactIdentifier, ArtifactEntry> = BTreeMap::new();
    let root = &result.root().id;

    for (index, edge) in result.dependencies_of(root).enumerate() {
        let Some(start) = &edge.selected else {
            continue;
        };

        for component in result.reachable_from(start) {
            let ComponentIdentifier::Module(module_version) = &component else {
                continue;
            };
            let Some(metadata) = selected.get(&module_version.module) else {
                continue;
            };

            for artifact in &metadata.artifacts {
                let id = ArtifactIdentifier {
                    component: component.clone(),
                    name: artifact.name.clone(),
                    extension: artifact.extension.clone(),
                    classifier: artifact.classifier.clone(),
                };
                entries
                    .entry(id.clone())
                    .or_insert_with(|| ArtifactEntry {
                        id,
                        module_version: module_version.clone(),
                        artifact_type: artifact.artifact_type.clone(),
                        attributes: artifact.attributes.clone(),
                        file: artifact.file.clone(),
                        built_by: artifact.built_by.clone(),
                        reachable_from: BTreeSet::new(),
                    })
                    .reachable_from
                    .insert(index);
            }
        }
    }

    VisitedArtifactSet::resolved(ResolvedArtifactSet::new(
        configuration.dependencies().to_vec(),
        entries.into_values().collect(),
    ))
}

/// Locked versions usable as pins
fn pins_from(lock_state: &LockState) -> BTreeMap<ModuleIdentifier, Version> {
    lock_state
        .locked_dependencies()
        .iter()
        .filter_map(|locked| match Version::parse(locked.version()) {
            Ok(version) => Some((locked.module.clone(), version)),
            Err(e) => {
                warn!("Ignoring lock entry {}: {}", locked, e);
                None
            }
        })
        .collect()
}

/// Differences between the lock state and what was resolved
fn lock_state_mismatches(
    locked: &BTreeSet<ModuleVersionIdentifier>,
    selected: &BTreeMap<ModuleIdentifier, ModuleMetadata>,
) -> Vec<String> {
    let mut details = Vec::new();

    for module in locked {
        match selected.get(&module.module) {
            None => details.push(format!(
                "Did not resolve '{}' which is part of the dependency lock state",
                module
            )),
            Some(metadata) if metadata.version.to_string() != module.version() => {
                details.push(format!(
                    "Dependency '{}' is locked to '{}' but resolved to '{}'",
                    module.module,
                    module.version(),
                    metadata.version
                ))
            }
            Some(_) => {}
        }
    }

    let locked_modules: BTreeSet<&ModuleIdentifier> = locked.iter().map(|m| &m.module).collect();
    for metadata in selected.values() {
        if !metadata.changing && !locked_modules.contains(&metadata.module) {
            details.push(format!(
                "Resolved '{}' which is not part of the dependency lock state",
                metadata.id()
            ));
        }
    }

    details
}

impl ConfigurationResolver for DefaultConfigurationResolver {
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        let walk = self.walk(configuration, &BTreeMap::new());
        let failure = walk.failure.clone();
        let (graph, artifacts) = walk.into_graph(failure);
        Ok(ResolverResults::build_dependencies_resolved(graph, artifacts))
    }

    fn resolve_graph(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        let display_name = configuration.display_name();
        let lock_state = if configuration.strategy().is_dependency_locking_enabled() {
            Some(self.lock_provider.load_lock_state(configuration.name())?)
        } else {
            None
        };

        let pins = lock_state.as_ref().map(pins_from).unwrap_or_default();
        let walk = self.walk(configuration, &pins);

        let mut failure = walk.failure.clone();
        if let Some(state) = lock_state.as_ref().filter(|s| s.must_validate_lock_state()) {
            let details = lock_state_mismatches(state.locked_dependencies(), &walk.selected);
            if failure.is_none() && !details.is_empty() {
                failure = Some(ResolveError::LockOutOfDate {
                    configuration: display_name.clone(),
                    details,
                });
            }
        }

        if lock_state.is_some() && failure.is_none() && walk.unresolved.is_empty() {
            let (changing, modules): (Vec<_>, Vec<_>) =
                walk.selected.values().partition(|metadata| metadata.changing);
            let modules: BTreeSet<_> = modules.into_iter().map(ModuleMetadata::id).collect();
            let changing: BTreeSet<_> = changing.into_iter().map(ModuleMetadata::id).collect();
            self.lock_provider
                .persist_resolved_dependencies(configuration.name(), &modules, &changing)?;
        }

        debug!(
            "Resolved {}: {} modules, {} unresolved",
            display_name,
            walk.selected.len(),
            walk.unresolved.len()
        );

        let (graph, artifacts) = walk.into_graph(failure);
        let lenient = LenientConfiguration::resolved(graph.clone(), artifacts.clone());
        let resolved = ResolvedConfiguration::new(graph.clone(), display_name, lenient);
        Ok(ResolverResults::graph_resolved(graph, resolved, artifacts))
    }

    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>> {
        self.repositories.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{Module, ResolutionStrategy};
    use crate::locking::InMemoryLockProvider;
    use crate::resolver::InMemoryRepository;
    use forge_config::LockMode;

    fn dep(notation: &str) -> Dependency {
        Dependency::parse(notation).unwrap()
    }

    fn module(name: &str, version: &str) -> ModuleMetadata {
        ModuleMetadata::new("g", name, Version::parse(version).unwrap())
    }

    fn resolver(repo: InMemoryRepository) -> DefaultConfigurationResolver {
        DefaultConfigurationResolver::new(
            vec![Arc::new(repo)],
            Arc::new(InMemoryLockProvider::default()),
        )
    }

    fn configuration(deps: &[&str]) -> DependencyConfiguration {
        DependencyConfiguration::new("runtime", Module::new("g", "app", "1.0"))
            .with_dependencies(deps.iter().map(|d| dep(d)))
    }

    #[test]
    fn test_transitive_requirement_raises_selection() {
        // util raises the requirement on core after core was first selected
        let repo = InMemoryRepository::new("local")
            .with_module(module("core", "1.0.0"))
            .with_module(module("core", "1.2.0").with_dependency(dep("g:extra:1.0")))
            .with_module(module("core", "2.0.0"))
            .with_module(module("util", "1.0.0").with_dependency(dep("g:core:>=1.2, <2")))
            .with_module(module("extra", "1.0.0"));

        let walk = resolver(repo).walk(
            &configuration(&["g:core:>=1.0, <1.2", "g:util:1.0"]),
            &BTreeMap::new(),
        );

        assert!(walk.unresolved.is_empty());
        let core = &walk.selected[&ModuleIdentifier::new("g", "core")];
        assert_eq!(core.version, Version::new(1, 2, 0));
        assert!(walk.selected.contains_key(&ModuleIdentifier::new("g", "extra")));
        assert!(walk.failure.is_none());
    }

    #[test]
    fn test_missing_module_is_unresolved_data() {
        let repo = InMemoryRepository::new("local").with_module(module("core", "1.0.0"));
        let walk = resolver(repo).walk(
            &configuration(&["g:core:1.0", "g:missing:1.0"]),
            &BTreeMap::new(),
        );

        assert!(walk.failure.is_none());
        assert_eq!(walk.unresolved.len(), 1);
        assert!(matches!(
            walk.unresolved[0].failure,
            ResolveError::ModuleNotFound { .. }
        ));
        assert_eq!(walk.result.edges().len(), 2);
    }

    #[test]
    fn test_lock_state_mismatches() {
        let locked = BTreeSet::from([
            "g:core:1.0.0".parse().unwrap(),
            "g:gone:1.0.0".parse().unwrap(),
        ]);
        let selected = BTreeMap::from([
            (ModuleIdentifier::new("g", "core"), module("core", "1.2.0")),
            (ModuleIdentifier::new("g", "new"), module("new", "1.0.0")),
            (ModuleIdentifier::new("g", "snap"), module("snap", "0.1.0").changing()),
        ]);

        let details = lock_state_mismatches(&locked, &selected);
        assert_eq!(details.len(), 3);
        assert!(details[0].contains("locked to '1.0.0' but resolved to '1.2.0'"));
        assert!(details[1].contains("Did not resolve 'g:gone:1.0.0'"));
        assert!(details[2].contains("'g:new:1.0.0' which is not part"));
    }

    #[test]
    fn test_locked_versions_pin_selection() {
        let repo = InMemoryRepository::new("local")
            .with_module(module("core", "1.0.0"))
            .with_module(module("core", "1.1.0"));
        let lock = InMemoryLockProvider::new(LockMode::Default, false)
            .with_locked("runtime", ["g:core:1.0.0".parse().unwrap()]);
        let resolver = DefaultConfigurationResolver::new(vec![Arc::new(repo)], Arc::new(lock));
        let config = configuration(&["g:core:^1.0"])
            .with_strategy(ResolutionStrategy::default().with_locking(true));

        let results = resolver.resolve_graph(&config).unwrap();
        assert!(!results.graph().has_any_failure());
        let resolved = results.resolved_configuration().unwrap();
        let first_level = resolved.first_level_module_dependencies(None).unwrap();
        assert_eq!(
            first_level.iter().map(|d| d.module_version.to_string()).collect::<Vec<_>>(),
            vec!["g:core:1.0.0"]
        );
    }
}
