//! Dependency lock state: loading pinned modules and recording resolutions

mod file;
mod lockfile;

pub use file::FileLockProvider;
pub use lockfile::{LockedConfiguration, Lockfile, LockfileMetadata};

use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleVersionIdentifier;
use forge_config::LockMode;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use tracing::debug;

/// Lock state loaded for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockState {
    locked: BTreeSet<ModuleVersionIdentifier>,
    must_validate: bool,
}

impl LockState {
    /// No recorded state, nothing to validate
    pub fn no_lock() -> Self {
        Self::default()
    }

    pub fn new(locked: BTreeSet<ModuleVersionIdentifier>, must_validate: bool) -> Self {
        Self {
            locked,
            must_validate,
        }
    }

    pub fn locked_dependencies(&self) -> &BTreeSet<ModuleVersionIdentifier> {
        &self.locked
    }

    /// Whether the resolution must be checked against the locked set
    pub fn must_validate_lock_state(&self) -> bool {
        self.must_validate
    }
}

/// Store of per-configuration lock state.
///
/// Implementations are shared across resolutions and must tolerate concurrent
/// calls for distinct configurations.
pub trait LockProvider: Send + Sync {
    fn load_lock_state(&self, configuration: &str) -> ResolveResult<LockState>;

    /// Record what a configuration resolved to. `changing_modules` are recorded
    /// in the entry without being pinned.
    fn persist_resolved_dependencies(
        &self,
        configuration: &str,
        modules: &BTreeSet<ModuleVersionIdentifier>,
        changing_modules: &BTreeSet<ModuleVersionIdentifier>,
    ) -> ResolveResult<()>;
}

/// Turn a stored entry into the lock state handed to a resolver
pub(crate) fn lock_state_from(
    mode: LockMode,
    write_locks: bool,
    configuration: &str,
    entry: Option<BTreeSet<ModuleVersionIdentifier>>,
) -> ResolveResult<LockState> {
    if write_locks {
        return Ok(LockState::no_lock());
    }

    match entry {
        Some(locked) => Ok(LockState::new(locked, mode != LockMode::Lenient)),
        None if mode == LockMode::Strict => {
            Err(ResolveError::MissingLockState(configuration.to_string()))
        }
        None => Ok(LockState::no_lock()),
    }
}

/// Observable lock store interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    Loaded(String),
    Persisted {
        configuration: String,
        modules: BTreeSet<ModuleVersionIdentifier>,
        changing: BTreeSet<ModuleVersionIdentifier>,
    },
}

#[derive(Debug, Default)]
struct InMemoryState {
    entries: BTreeMap<String, BTreeSet<ModuleVersionIdentifier>>,
    events: Vec<LockEvent>,
}

/// Lock store held in memory; every call is recorded
#[derive(Debug, Default)]
pub struct InMemoryLockProvider {
    mode: LockMode,
    write_locks: bool,
    state: Mutex<InMemoryState>,
}

impl InMemoryLockProvider {
    pub fn new(mode: LockMode, write_locks: bool) -> Self {
        Self {
            mode,
            write_locks,
            state: Mutex::default(),
        }
    }

    /// Seed a locked entry for `configuration`
    pub fn with_locked<I>(self, configuration: &str, modules: I) -> Self
    where
        I: IntoIterator<Item = ModuleVersionIdentifier>,
    {
        if let Ok(mut state) = self.state.lock() {
            state
                .entries
                .insert(configuration.to_string(), modules.into_iter().collect());
        }
        self
    }

    /// Calls made so far, in order
    pub fn events(&self) -> Vec<LockEvent> {
        self.state
            .lock()
            .map(|state| state.events.clone())
            .unwrap_or_default()
    }

    /// Modules currently recorded for `configuration`
    pub fn entry(&self, configuration: &str) -> Option<BTreeSet<ModuleVersionIdentifier>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.entries.get(configuration).cloned())
    }

    fn lock(&self) -> ResolveResult<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|_| ResolveError::LockStore("in-memory lock state poisoned".to_string()))
    }
}

impl LockProvider for InMemoryLockProvider {
    fn load_lock_state(&self, configuration: &str) -> ResolveResult<LockState> {
        let mut state = self.lock()?;
        state.events.push(LockEvent::Loaded(configuration.to_string()));
        let entry = state.entries.get(configuration).cloned();
        lock_state_from(self.mode, self.write_locks, configuration, entry)
    }

    fn persist_resolved_dependencies(
        &self,
        configuration: &str,
        modules: &BTreeSet<ModuleVersionIdentifier>,
        changing_modules: &BTreeSet<ModuleVersionIdentifier>,
    ) -> ResolveResult<()> {
        let mut state = self.lock()?;
        state.events.push(LockEvent::Persisted {
            configuration: configuration.to_string(),
            modules: modules.clone(),
            changing: changing_modules.clone(),
        });
        if self.write_locks {
            debug!("Recording {} locked modules for {}", modules.len(), configuration);
            state
                .entries
                .insert(configuration.to_string(), modules.clone());
        }
        Ok(())
    }
}
