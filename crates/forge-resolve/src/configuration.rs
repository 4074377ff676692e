//! Declared configurations: what a build module asks to have resolved

use crate::attributes::AttributeContainer;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleIdentifier;
use forge_config::project::UNSPECIFIED_VERSION;
use forge_config::{Config, ConflictStrategy, ResolutionSettings};
use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The module that owns a configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Module {
    pub group: String,
    pub name: String,
    pub version: String,
    /// Project path when the module is a project of the current build
    pub project_path: Option<String>,
}

impl Module {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            project_path: None,
        }
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }
}

/// A declared dependency requirement (`group:name:requirement`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub module: ModuleIdentifier,
    pub requirement: VersionReq,
}

impl Dependency {
    pub fn new(group: impl Into<String>, name: impl Into<String>, requirement: VersionReq) -> Self {
        Self {
            module: ModuleIdentifier::new(group, name),
            requirement,
        }
    }

    /// Parse a `group:name[:requirement]` notation. A missing requirement means any version.
    pub fn parse(notation: &str) -> ResolveResult<Self> {
        let parts: Vec<&str> = notation.split(':').collect();
        let (group, name, requirement) = match parts.as_slice() {
            [group, name] => (*group, *name, "*"),
            [group, name, requirement] => (*group, *name, *requirement),
            _ => {
                return Err(ResolveError::invalid_dependency(
                    notation,
                    "expected 'group:name[:requirement]'",
                ))
            }
        };

        if name.is_empty() {
            return Err(ResolveError::invalid_dependency(notation, "name cannot be empty"));
        }

        let requirement = VersionReq::parse(requirement)
            .map_err(|e| ResolveError::invalid_dependency(notation, e))?;

        Ok(Self::new(group, name, requirement))
    }

    pub fn group(&self) -> &str {
        &self.module.group
    }

    pub fn name(&self) -> &str {
        &self.module.name
    }

    /// Check if a candidate version satisfies this requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.requirement.matches(version)
    }
}

impl FromStr for Dependency {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.requirement)
    }
}

/// Predicate over declared dependencies, used to filter query results
#[derive(Clone)]
pub struct DependencySpec {
    predicate: Arc<dyn Fn(&Dependency) -> bool + Send + Sync>,
}

impl DependencySpec {
    pub fn new(predicate: impl Fn(&Dependency) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Accepts every dependency
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Accepts dependencies on modules of `group`
    pub fn group(group: impl Into<String>) -> Self {
        let group = group.into();
        Self::new(move |dep| dep.group() == group)
    }

    /// Accepts dependencies on exactly `group:name`
    pub fn module(group: impl Into<String>, name: impl Into<String>) -> Self {
        let module = ModuleIdentifier::new(group, name);
        Self::new(move |dep| dep.module == module)
    }

    pub fn is_satisfied_by(&self, dependency: &Dependency) -> bool {
        (self.predicate)(dependency)
    }

    /// Optional spec semantics: `None` accepts everything
    pub(crate) fn accepts(spec: Option<&DependencySpec>, dependency: &Dependency) -> bool {
        spec.map_or(true, |spec| spec.is_satisfied_by(dependency))
    }
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DependencySpec(..)")
    }
}

/// Resolution strategy, captured once per configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionStrategy {
    pub conflict: ConflictStrategy,
    pub locking_enabled: bool,
}

impl ResolutionStrategy {
    pub fn new(conflict: ConflictStrategy, locking_enabled: bool) -> Self {
        Self {
            conflict,
            locking_enabled,
        }
    }

    pub fn with_locking(mut self, enabled: bool) -> Self {
        self.locking_enabled = enabled;
        self
    }

    pub fn from_settings(settings: &ResolutionSettings) -> Self {
        Self::new(settings.conflict, settings.locking)
    }

    pub fn is_dependency_locking_enabled(&self) -> bool {
        self.locking_enabled
    }
}

/// A named set of declared dependencies belonging to a module
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyConfiguration {
    name: String,
    module: Module,
    dependencies: Vec<Dependency>,
    strategy: ResolutionStrategy,
    attributes: AttributeContainer,
}

impl DependencyConfiguration {
    pub fn new(name: impl Into<String>, module: Module) -> Self {
        Self {
            name: name.into(),
            module,
            dependencies: Vec::new(),
            strategy: ResolutionStrategy::default(),
            attributes: AttributeContainer::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = Dependency>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.with(key, value);
        self
    }

    pub fn with_attributes(mut self, attributes: AttributeContainer) -> Self {
        self.attributes = attributes;
        self
    }

    /// Build a configuration from its `forge.toml` declaration
    pub fn from_config(name: &str, config: &Config) -> ResolveResult<Self> {
        let section = config
            .configuration(name)
            .ok_or_else(|| ResolveError::UnknownConfiguration(name.to_string()))?;

        let module = match &config.project.project {
            Some(project) => {
                let module = Module::new(&project.group, &project.name, project.version());
                match &project.path {
                    Some(path) => module.with_project_path(path),
                    None => module,
                }
            }
            None => Module::new("", "unnamed", UNSPECIFIED_VERSION),
        };

        let dependencies = section
            .dependencies
            .iter()
            .map(|notation| Dependency::parse(notation))
            .collect::<ResolveResult<Vec<_>>>()?;

        let mut strategy = ResolutionStrategy::from_settings(&config.effective_resolution());
        if let Some(locking) = section.locking {
            strategy = strategy.with_locking(locking);
        }

        Ok(Self::new(name, module)
            .with_dependencies(dependencies)
            .with_strategy(strategy)
            .with_attributes(section.attributes.iter().collect()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// Name used in diagnostics
    pub fn display_name(&self) -> String {
        match &self.module.project_path {
            Some(path) if path != ":" => format!("configuration '{}:{}'", path, self.name),
            _ => format!("configuration ':{}'", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_config::{ConfigurationSection, GlobalConfig, ProjectConfig, ResolutionConfig};
    use rstest::rstest;

    #[rstest]
    #[case("org.example:core:^1.2", "org.example", "core", "^1.2")]
    #[case("org.example:core", "org.example", "core", "*")]
    #[case(":local:=2.0.0", "", "local", "=2.0.0")]
    fn test_parse_dependency(
        #[case] notation: &str,
        #[case] group: &str,
        #[case] name: &str,
        #[case] requirement: &str,
    ) {
        let dep = Dependency::parse(notation).unwrap();
        assert_eq!(dep.group(), group);
        assert_eq!(dep.name(), name);
        assert_eq!(dep.requirement, VersionReq::parse(requirement).unwrap());
    }

    #[rstest]
    #[case("core")]
    #[case("org.example:")]
    #[case("org.example:core:not-a-version")]
    #[case("a:b:c:d")]
    fn test_parse_dependency_invalid(#[case] notation: &str) {
        assert!(matches!(
            Dependency::parse(notation),
            Err(ResolveError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn test_has_dependencies() {
        let module = Module::new("org.example", "app", "1.0");
        let empty = DependencyConfiguration::new("compile", module.clone());
        assert!(!empty.has_dependencies());

        let with_dep = empty.with_dependency(Dependency::parse("org.example:core:1.0").unwrap());
        assert!(with_dep.has_dependencies());
    }

    #[test]
    fn test_dependency_spec() {
        let dep = Dependency::parse("org.example:core:1.0").unwrap();
        assert!(DependencySpec::all().is_satisfied_by(&dep));
        assert!(DependencySpec::group("org.example").is_satisfied_by(&dep));
        assert!(!DependencySpec::module("org.example", "util").is_satisfied_by(&dep));
        assert!(DependencySpec::accepts(None, &dep));
    }

    #[test]
    fn test_display_name() {
        let root = DependencyConfiguration::new("runtime", Module::new("g", "app", "1.0"));
        assert_eq!(root.display_name(), "configuration ':runtime'");

        let project = DependencyConfiguration::new(
            "runtime",
            Module::new("g", "lib", "1.0").with_project_path(":lib"),
        );
        assert_eq!(project.display_name(), "configuration ':lib:runtime'");
    }

    #[test]
    fn test_from_config() {
        let mut project = ProjectConfig::from_str(
            r#"
[project]
group = "org.example"
name = "app"
version = "1.0.0"

[resolution]
locking = true

[configurations.compile]
dependencies = ["org.example:core:^1.0"]
attributes = { usage = "api" }
"#,
        )
        .unwrap();
        project.configurations.insert(
            "runtime".to_string(),
            ConfigurationSection {
                locking: Some(false),
                ..Default::default()
            },
        );
        let config = Config {
            project,
            global: GlobalConfig {
                resolution: Some(ResolutionConfig::default()),
            },
            project_root: None,
        };

        let compile = DependencyConfiguration::from_config("compile", &config).unwrap();
        assert!(compile.has_dependencies());
        assert!(compile.strategy().is_dependency_locking_enabled());
        assert_eq!(compile.attributes().get("usage"), Some("api"));
        assert_eq!(compile.module().version, "1.0.0");

        let runtime = DependencyConfiguration::from_config("runtime", &config).unwrap();
        assert!(!runtime.has_dependencies());
        assert!(!runtime.strategy().is_dependency_locking_enabled());

        assert!(matches!(
            DependencyConfiguration::from_config("test", &config),
            Err(ResolveError::UnknownConfiguration(_))
        ));
    }
}
