//! Empty-configuration short-circuit behavior

use forge_config::LockMode;
use forge_resolve::resolver::ModuleMetadata;
use forge_resolve::{
    ArtifactCollector, ArtifactSelectionSpec, ConfigurationResolver, DefaultConfigurationResolver,
    Dependency, DependencyConfiguration, DependencySpec, InMemoryLockProvider,
    InMemoryRepository, LockEvent, Module, ModuleRepository, ModuleVersionIdentifier,
    ResolutionPhase, ResolutionStrategy, ResolveError, ResolveResult, ResolverResults,
    ShortCircuitResolver,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use semver::Version;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegate that counts how often it is asked to resolve
struct CountingResolver {
    inner: DefaultConfigurationResolver,
    build_dependencies: AtomicUsize,
    graphs: AtomicUsize,
}

impl CountingResolver {
    fn new(lock: Arc<InMemoryLockProvider>) -> Self {
        let repo = InMemoryRepository::new("local").with_module(ModuleMetadata::new(
            "org.example",
            "core",
            Version::new(1, 0, 0),
        ));
        Self {
            inner: DefaultConfigurationResolver::new(vec![Arc::new(repo)], lock),
            build_dependencies: AtomicUsize::new(0),
            graphs: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.build_dependencies.load(Ordering::SeqCst),
            self.graphs.load(Ordering::SeqCst),
        )
    }
}

impl ConfigurationResolver for CountingResolver {
    fn resolve_build_dependencies(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        self.build_dependencies.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_build_dependencies(configuration)
    }

    fn resolve_graph(
        &self,
        configuration: &DependencyConfiguration,
    ) -> ResolveResult<ResolverResults> {
        self.graphs.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_graph(configuration)
    }

    fn all_repositories(&self) -> Vec<Arc<dyn ModuleRepository>> {
        self.inner.all_repositories()
    }
}

struct Fixture {
    lock: Arc<InMemoryLockProvider>,
    resolver: ShortCircuitResolver<CountingResolver>,
}

fn fixture(lock: InMemoryLockProvider) -> Fixture {
    let lock = Arc::new(lock);
    let resolver =
        ShortCircuitResolver::with_defaults(CountingResolver::new(lock.clone()), lock.clone());
    Fixture { lock, resolver }
}

fn configuration(name: &str, locking: bool) -> DependencyConfiguration {
    DependencyConfiguration::new(name, Module::new("org.example", "app", "1.0.0"))
        .with_strategy(ResolutionStrategy::default().with_locking(locking))
        .with_attribute("usage", "runtime")
}

fn mvi(s: &str) -> ModuleVersionIdentifier {
    s.parse().unwrap()
}

fn assert_empty_graph(results: &ResolverResults) {
    let graph = results.graph();
    assert!(!graph.has_any_failure());
    assert!(graph.unresolved_dependencies().is_empty());

    let result = graph.resolution_result();
    assert!(result.is_empty());
    assert_eq!(result.root().module_version, mvi("org.example:app:1.0.0"));
    assert_eq!(result.attributes().get("usage"), Some("runtime"));
    assert!(results.visited_artifacts().is_empty_result());
}

#[test]
fn test_build_dependencies_of_empty_configuration() {
    let f = fixture(InMemoryLockProvider::default());

    let results = f
        .resolver
        .resolve_build_dependencies(&configuration("compile", false))
        .unwrap();

    assert_eq!(results.phase(), ResolutionPhase::BuildDependencies);
    assert!(results.resolved_configuration().is_none());
    assert_empty_graph(&results);
    assert_eq!(f.resolver.delegate().calls(), (0, 0));
    assert!(f.lock.events().is_empty());
}

#[test]
fn test_build_dependencies_never_touch_lock_state() {
    let f = fixture(
        InMemoryLockProvider::new(LockMode::Default, false)
            .with_locked("compile", [mvi("org.example:core:1.0.0")]),
    );

    f.resolver
        .resolve_build_dependencies(&configuration("compile", true))
        .unwrap();

    assert!(f.lock.events().is_empty());
    assert_eq!(f.resolver.delegate().calls(), (0, 0));
}

#[test]
fn test_graph_without_locking_does_no_lock_io() {
    let f = fixture(InMemoryLockProvider::default());

    let results = f.resolver.resolve_graph(&configuration("runtime", false)).unwrap();

    assert_eq!(results.phase(), ResolutionPhase::Graph);
    assert_empty_graph(&results);
    assert!(f.lock.events().is_empty());
    assert_eq!(f.resolver.delegate().calls(), (0, 0));
}

#[test]
fn test_fresh_lock_state_persists_empty_entry() {
    let f = fixture(InMemoryLockProvider::default());

    let results = f.resolver.resolve_graph(&configuration("runtime", true)).unwrap();

    assert_eq!(
        f.lock.events(),
        vec![
            LockEvent::Loaded("runtime".to_string()),
            LockEvent::Persisted {
                configuration: "runtime".to_string(),
                modules: BTreeSet::new(),
                changing: BTreeSet::new(),
            },
        ]
    );
    assert_empty_graph(&results);
    let resolved = results.resolved_configuration().unwrap();
    assert!(resolved.lenient_configuration().is_empty_result());
    assert!(resolved.lenient_configuration().files(None).is_empty());
    assert!(resolved.files(None).unwrap().is_empty());
    assert_eq!(f.resolver.delegate().calls(), (0, 0));
}

#[test]
fn test_locked_modules_force_full_resolution() {
    let f = fixture(
        InMemoryLockProvider::new(LockMode::Default, false)
            .with_locked("runtime", [mvi("org.example:core:1.0.0")]),
    );

    let results = f.resolver.resolve_graph(&configuration("runtime", true)).unwrap();

    assert_eq!(f.resolver.delegate().calls(), (0, 1));
    assert!(!results.visited_artifacts().is_empty_result());
    let resolved = results.resolved_configuration().unwrap();
    assert!(!resolved.lenient_configuration().is_empty_result());

    match results.graph().failure() {
        Some(ResolveError::LockOutOfDate { configuration, details }) => {
            assert_eq!(configuration, "configuration ':runtime'");
            assert_eq!(details.len(), 1);
            assert!(details[0].contains("org.example:core:1.0.0"));
        }
        other => panic!("Expected lock out of date failure, got {:?}", other),
    }
    assert!(resolved.rethrow_failure().is_err());
}

#[rstest]
#[case(LockMode::Lenient, false)]
#[case(LockMode::Default, true)]
fn test_locked_modules_without_validation_short_circuit(
    #[case] mode: LockMode,
    #[case] write_locks: bool,
) {
    let f = fixture(
        InMemoryLockProvider::new(mode, write_locks)
            .with_locked("runtime", [mvi("org.example:core:1.0.0")]),
    );

    let results = f.resolver.resolve_graph(&configuration("runtime", true)).unwrap();

    assert_eq!(f.resolver.delegate().calls(), (0, 0));
    assert_empty_graph(&results);
    assert!(matches!(
        f.lock.events().last(),
        Some(LockEvent::Persisted { modules, .. }) if modules.is_empty()
    ));
}

#[test]
fn test_empty_lock_entry_short_circuits() {
    let f = fixture(
        InMemoryLockProvider::new(LockMode::Strict, false)
            .with_locked("runtime", Vec::<ModuleVersionIdentifier>::new()),
    );

    let results = f.resolver.resolve_graph(&configuration("runtime", true)).unwrap();

    assert_eq!(f.resolver.delegate().calls(), (0, 0));
    assert_empty_graph(&results);
}

#[test]
fn test_strict_mode_without_lock_entry_fails() {
    let f = fixture(InMemoryLockProvider::new(LockMode::Strict, false));

    let result = f.resolver.resolve_graph(&configuration("runtime", true));

    assert_eq!(
        result.unwrap_err(),
        ResolveError::MissingLockState("runtime".to_string())
    );
    assert_eq!(f.resolver.delegate().calls(), (0, 0));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_configurations_with_dependencies_delegate(#[case] locking: bool) {
    let f = fixture(InMemoryLockProvider::default());
    let config = configuration("runtime", locking)
        .with_dependency(Dependency::parse("org.example:core:^1.0").unwrap());

    f.resolver.resolve_build_dependencies(&config).unwrap();
    let results = f.resolver.resolve_graph(&config).unwrap();

    assert_eq!(f.resolver.delegate().calls(), (1, 1));
    assert!(!results.graph().resolution_result().is_empty());

    // Only the delegate talks to the lock store
    let expected_events = if locking { 2 } else { 0 };
    assert_eq!(f.lock.events().len(), expected_events);
}

#[test]
fn test_repositories_pass_through() {
    let f = fixture(InMemoryLockProvider::default());
    let names: Vec<_> = f
        .resolver
        .all_repositories()
        .iter()
        .map(|repo| repo.name().to_string())
        .collect();
    assert_eq!(names, vec!["local"]);
}

#[test]
fn test_empty_results_answer_every_query() {
    let f = fixture(InMemoryLockProvider::default());
    let results = f.resolver.resolve_graph(&configuration("runtime", false)).unwrap();
    let resolved = results.resolved_configuration().unwrap();
    let lenient = resolved.lenient_configuration();
    let always = DependencySpec::all();

    assert_eq!(
        lenient.first_level_module_dependencies(None),
        lenient.first_level_module_dependencies(Some(&always))
    );
    assert!(lenient.all_module_dependencies().is_empty());
    assert!(lenient.unresolved_module_dependencies().is_empty());
    assert!(lenient.artifacts(None).is_empty());
    assert!(resolved.resolved_artifacts().unwrap().is_empty());

    let selected = results
        .visited_artifacts()
        .select(Some(&always), &ArtifactSelectionSpec::of_types(["jar"]));
    assert!(selected.is_empty_result());
    let mut collector = ArtifactCollector::new();
    selected.visit_artifacts(&mut collector, false);
    assert_eq!(collector, ArtifactCollector::new());
}

#[test]
fn test_concurrent_resolution_of_distinct_configurations() {
    let f = fixture(InMemoryLockProvider::default());
    let resolver = Arc::new(f.resolver);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || {
                resolver
                    .resolve_graph(&configuration(&format!("conf{}", i), true))
                    .map(|results| results.phase())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(ResolutionPhase::Graph));
    }
    assert_eq!(f.lock.events().len(), 16);
}
