//! Version conflicts between requirements on the same module

use crate::ids::ModuleIdentifier;
use semver::VersionReq;
use std::fmt;

/// A requirement on a module, with the component that declared it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub requirement: VersionReq,
    pub source: String,
}

impl VersionConstraint {
    pub fn new(requirement: VersionReq, source: impl Into<String>) -> Self {
        Self {
            requirement,
            source: source.into(),
        }
    }
}

/// Requirements on one module that no single version satisfies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub module: ModuleIdentifier,
    pub constraints: Vec<VersionConstraint>,
}

impl Conflict {
    pub fn new(module: ModuleIdentifier, constraints: Vec<VersionConstraint>) -> Self {
        Self {
            module,
            constraints,
        }
    }

    /// Human-readable conflict report
    pub fn report(&self) -> String {
        let mut report = format!("Version conflict for module '{}':\n", self.module);

        for constraint in &self.constraints {
            report.push_str(&format!(
                "  {} requires {}\n",
                constraint.source, constraint.requirement
            ));
        }

        report.push_str("\nPossible solutions:\n");
        report.push_str("  1. Align the requirements on a common version range\n");
        report.push_str("  2. Set conflict = \"latest\" under [resolution] in forge.toml\n");

        report
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report().trim_end())
    }
}
