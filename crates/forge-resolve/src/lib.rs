//! Forge Dependency Resolution
//!
//! Resolves a configuration's declared dependencies in two phases: build
//! dependencies (which build steps must run first) and the full graph (which
//! files, with which failures). Configurations without declared dependencies
//! are answered with empty results, while keeping the dependency lock state
//! consistent.
//!
//! # Example
//!
//! ```no_run
//! use forge_resolve::{
//!     ConfigurationResolver, DefaultConfigurationResolver, DependencyConfiguration,
//!     FileLockProvider, ShortCircuitResolver,
//! };
//! use forge_config::ConfigLoader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! let locks = Arc::new(FileLockProvider::from_config(&config));
//! let resolver = ShortCircuitResolver::with_defaults(
//!     DefaultConfigurationResolver::new(Vec::new(), locks.clone()),
//!     locks,
//! );
//!
//! let runtime = DependencyConfiguration::from_config("runtime", &config).unwrap();
//! let results = resolver.resolve_graph(&runtime).unwrap();
//! let lenient = results.resolved_configuration().unwrap().lenient_configuration();
//! for file in lenient.files(None) {
//!     println!("{}", file.display());
//! }
//! ```

pub mod artifacts;
pub mod attributes;
pub mod configuration;
pub mod error;
pub mod graph;
pub mod ids;
pub mod lenient;
pub mod locking;
pub mod resolver;
pub mod results;

pub use artifacts::{
    ArtifactCollector, ArtifactSelectionSpec, ArtifactVisitor, ResolvedArtifact,
    SelectedArtifactSet, TaskDependencyContext, TaskDependencySet, TaskPath, VisitedArtifactSet,
};
pub use attributes::AttributeContainer;
pub use configuration::{
    Dependency, DependencyConfiguration, DependencySpec, Module, ResolutionStrategy,
};
pub use error::{ResolveError, ResolveResult};
pub use graph::{GraphResolutionResult, ResolutionResult, UnresolvedDependency};
pub use ids::{ComponentIdentifier, ModuleIdentifier, ModuleVersionIdentifier};
pub use lenient::{LenientConfiguration, ResolvedConfiguration, ResolvedDependency};
pub use locking::{FileLockProvider, InMemoryLockProvider, LockEvent, LockProvider, LockState};
pub use resolver::{
    ConfigurationResolver, DefaultConfigurationResolver, InMemoryRepository, ModuleRepository,
    ShortCircuitResolver,
};
pub use results::{ResolutionPhase, ResolverResults};
