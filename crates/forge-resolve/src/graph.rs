//! Resolution graph results

use crate::attributes::AttributeContainer;
use crate::configuration::Dependency;
use crate::error::ResolveError;
use crate::ids::{ComponentIdentifier, ModuleVersionIdentifier};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// A component selected into a resolution graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedComponent {
    pub id: ComponentIdentifier,
    pub module_version: ModuleVersionIdentifier,
}

/// An edge from a component to the component selected for one of its requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: ComponentIdentifier,
    pub requested: Dependency,
    /// `None` when the requirement could not be satisfied
    pub selected: Option<ComponentIdentifier>,
}

/// Root component, attributes and edges of a resolved graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    root: ResolvedComponent,
    attributes: AttributeContainer,
    components: BTreeMap<ComponentIdentifier, ResolvedComponent>,
    edges: Vec<DependencyEdge>,
}

impl ResolutionResult {
    /// A graph made of the root component alone
    pub fn empty(
        module_version: ModuleVersionIdentifier,
        component: ComponentIdentifier,
        attributes: AttributeContainer,
    ) -> Self {
        let root = ResolvedComponent {
            id: component,
            module_version,
        };
        let mut components = BTreeMap::new();
        components.insert(root.id.clone(), root.clone());

        Self {
            root,
            attributes,
            components,
            edges: Vec::new(),
        }
    }

    pub(crate) fn add_component(&mut self, component: ResolvedComponent) {
        self.components.insert(component.id.clone(), component);
    }

    pub(crate) fn add_edge(&mut self, edge: DependencyEdge) {
        self.edges.push(edge);
    }

    pub fn root(&self) -> &ResolvedComponent {
        &self.root
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn component(&self, id: &ComponentIdentifier) -> Option<&ResolvedComponent> {
        self.components.get(id)
    }

    /// All components, root included
    pub fn components(&self) -> impl Iterator<Item = &ResolvedComponent> {
        self.components.values()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Outgoing edges of a component, in declaration order
    pub fn dependencies_of<'a>(
        &'a self,
        id: &'a ComponentIdentifier,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges.iter().filter(move |edge| &edge.from == id)
    }

    /// Components reachable from `start` through selected edges, `start` included
    pub fn reachable_from(&self, start: &ComponentIdentifier) -> BTreeSet<ComponentIdentifier> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start.clone()]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for edge in self.dependencies_of(&id) {
                if let Some(selected) = &edge.selected {
                    queue.push_back(selected.clone());
                }
            }
        }

        seen
    }

    /// True when the root has no outgoing edges, resolved or not
    pub fn is_empty(&self) -> bool {
        self.dependencies_of(&self.root.id).next().is_none()
    }
}

/// A requirement that could not be satisfied, with its cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub requested: Dependency,
    pub from: ComponentIdentifier,
    pub failure: ResolveError,
}

impl UnresolvedDependency {
    /// One-line description for reports
    pub fn describe(&self) -> String {
        format!("{} (required by {}): {}", self.requested, self.from, self.failure)
    }
}

/// Outcome of a graph resolution attempt.
///
/// When `failure` is present the resolution result is still a best-effort
/// partial graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResolutionResult {
    result: Arc<ResolutionResult>,
    unresolved: Arc<[UnresolvedDependency]>,
    failure: Option<ResolveError>,
}

impl GraphResolutionResult {
    pub fn new(
        result: ResolutionResult,
        unresolved: Vec<UnresolvedDependency>,
        failure: Option<ResolveError>,
    ) -> Self {
        Self {
            result: Arc::new(result),
            unresolved: unresolved.into(),
            failure,
        }
    }

    pub fn resolution_result(&self) -> &ResolutionResult {
        &self.result
    }

    pub fn unresolved_dependencies(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    pub fn failure(&self) -> Option<&ResolveError> {
        self.failure.as_ref()
    }

    /// Root failure or any unresolved dependency
    pub fn has_any_failure(&self) -> bool {
        self.failure.is_some() || !self.unresolved.is_empty()
    }

    /// Root failure first, then unresolved dependency causes
    pub fn failures(&self) -> Vec<ResolveError> {
        self.failure
            .iter()
            .cloned()
            .chain(self.unresolved.iter().map(|u| u.failure.clone()))
            .collect()
    }
}
