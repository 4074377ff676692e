use super::conflict::{Conflict, VersionConstraint};
use crate::ids::ModuleIdentifier;
use forge_config::ConflictStrategy;
use semver::Version;

/// Outcome of choosing a version for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelection {
    Selected(Version),
    /// No version satisfies every requirement. The fallback keeps the graph walkable.
    Conflicting { fallback: Version, conflict: Conflict },
    /// No available version satisfies any requirement
    NoMatch,
}

/// Picks module versions according to a conflict strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionSolver {
    strategy: ConflictStrategy,
}

impl VersionSolver {
    pub fn new(strategy: ConflictStrategy) -> Self {
        Self { strategy }
    }

    /// Choose a version of `module` from `available` (ascending).
    ///
    /// A pinned version wins when it is available and satisfies every requirement.
    pub fn select(
        &self,
        module: &ModuleIdentifier,
        available: &[Version],
        constraints: &[VersionConstraint],
        pin: Option<&Version>,
    ) -> VersionSelection {
        let satisfies_all =
            |v: &Version| constraints.iter().all(|c| c.requirement.matches(v));

        if let Some(pin) = pin.filter(|pin| available.contains(pin) && satisfies_all(pin)) {
            return VersionSelection::Selected(pin.clone());
        }

        if let Some(version) = Self::max_satisfying_version(available, constraints) {
            return VersionSelection::Selected(version);
        }

        // Highest version satisfying at least one requirement
        let Some(fallback) = available
            .iter()
            .rev()
            .find(|v| constraints.iter().any(|c| c.requirement.matches(v)))
            .cloned()
        else {
            return VersionSelection::NoMatch;
        };

        match self.strategy {
            ConflictStrategy::Latest => VersionSelection::Selected(fallback),
            ConflictStrategy::Fail => VersionSelection::Conflicting {
                fallback,
                conflict: Conflict::new(module.clone(), constraints.to_vec()),
            },
        }
    }

    /// Find maximum version satisfying all constraints
    pub fn max_satisfying_version(
        available: &[Version],
        constraints: &[VersionConstraint],
    ) -> Option<Version> {
        available
            .iter()
            .filter(|v| constraints.iter().all(|c| c.requirement.matches(v)))
            .max()
            .cloned()
    }
}
