use super::{lock_state_from, LockProvider, LockState, Lockfile};
use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleVersionIdentifier;
use forge_config::{Config, LockMode, ResolutionSettings};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Lock store backed by a lockfile on disk.
///
/// The file is read once and cached. It is only rewritten in write-locks mode,
/// and only when an entry actually changes. The cache only holds entries that
/// were written successfully.
#[derive(Debug)]
pub struct FileLockProvider {
    path: PathBuf,
    mode: LockMode,
    write_locks: bool,
    cache: Mutex<Option<Lockfile>>,
}

impl FileLockProvider {
    pub fn new(path: impl Into<PathBuf>, mode: LockMode, write_locks: bool) -> Self {
        Self {
            path: path.into(),
            mode,
            write_locks,
            cache: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &ResolutionSettings) -> Self {
        Self::new(&settings.lockfile, settings.lock_mode, settings.write_locks)
    }

    /// Lock store for a loaded project, with the lockfile under its root
    pub fn from_config(config: &Config) -> Self {
        let settings = config.effective_resolution();
        Self::new(config.lockfile_path(), settings.lock_mode, settings.write_locks)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lockfile(&self) -> ResolveResult<MutexGuard<'_, Option<Lockfile>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ResolveError::LockStore(format!("{} cache poisoned", self.path.display())))?;

        if cache.is_none() {
            let lockfile = if self.path.exists() {
                debug!("Reading lockfile {}", self.path.display());
                match Lockfile::from_file(&self.path) {
                    Ok(lockfile) => lockfile,
                    // Stored entries are ignored when writing locks
                    Err(e) if self.write_locks => {
                        warn!("Replacing unreadable lockfile: {}", e);
                        Lockfile::new()
                    }
                    Err(e) => return Err(e),
                }
            } else {
                Lockfile::new()
            };
            *cache = Some(lockfile);
        }

        Ok(cache)
    }
}

impl LockProvider for FileLockProvider {
    fn load_lock_state(&self, configuration: &str) -> ResolveResult<LockState> {
        let cache = self.lockfile()?;
        let entry = cache.as_ref().and_then(|lockfile| lockfile.entry(configuration));
        lock_state_from(self.mode, self.write_locks, configuration, entry)
    }

    fn persist_resolved_dependencies(
        &self,
        configuration: &str,
        modules: &BTreeSet<ModuleVersionIdentifier>,
        changing_modules: &BTreeSet<ModuleVersionIdentifier>,
    ) -> ResolveResult<()> {
        if !self.write_locks {
            return Ok(());
        }

        let mut cache = self.lockfile()?;
        let Some(cached) = cache.as_ref() else {
            return Ok(());
        };

        let mut updated = cached.clone();
        if updated.set_entry(configuration, modules, changing_modules) {
            info!(
                "Writing lock state for {} ({} modules) to {}",
                configuration,
                modules.len(),
                self.path.display()
            );
            updated.write_to_file(&self.path)?;
            *cache = Some(updated);
        }

        Ok(())
    }
}
