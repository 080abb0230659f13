// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod manager.
//!
//! Ties the [`Catalog`], the [`StateStore`], and version control access
//! together. Every operation reads the state document once at the start,
//! runs the matching reconciliation or mutation, and writes the resulting
//! document once at the end.

use crate::{
    catalog::{Catalog, CatalogEntry},
    config::{InstalledEntry, StateDocument},
    mutate::{self, ModError, UpdateOptions, UpdateOutcome},
    reconcile::{reconcile, ReconcileError, Reconciliation},
    store::{StateStore, StoreError},
    vcs::{Git2Vcs, VersionControl},
};

use indicatif::ProgressBar;
use std::{path::Path, sync::Arc};
use tracing::instrument;

/// Manage mods of an installation directory.
#[derive(Debug)]
pub struct ModManager<V = Git2Vcs>
where
    V: VersionControl,
{
    catalog: Catalog,
    store: StateStore,
    vcs: Arc<V>,
}

impl<V> ModManager<V>
where
    V: VersionControl,
{
    /// Construct new mod manager.
    pub fn new(catalog: Catalog, store: StateStore, vcs: V) -> Self {
        Self {
            catalog,
            store,
            vcs: Arc::new(vcs),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current state document as persisted.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded.
    pub fn state(&self) -> Result<StateDocument> {
        Ok(self.store.load()?)
    }

    /// Catalog entries that are not tracked yet.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded.
    pub fn installable(&self) -> Result<Vec<&CatalogEntry>> {
        let state = self.store.load()?;
        Ok(self
            .catalog
            .iter()
            .filter(|entry| !state.is_installed(&entry.remote))
            .collect())
    }

    /// Rebuild state document from installation directory contents.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded or saved.
    /// - Return [`ManagerError::Reconcile`] if the installation directory
    ///   cannot be listed.
    #[instrument(skip(self), level = "debug")]
    pub async fn check(&self, root: &Path) -> Result<Reconciliation> {
        let prior = self.store.load()?;
        let reconciliation = reconcile(root, &self.catalog, &prior, Arc::clone(&self.vcs)).await?;
        self.store.save(&reconciliation.state)?;

        Ok(reconciliation)
    }

    /// Install catalog mod into installation directory.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded or saved.
    /// - Return [`ManagerError::Mod`] if installation fails.
    #[instrument(skip(self, bar), level = "debug")]
    pub fn install(&self, name: &str, root: &Path, bar: ProgressBar) -> Result<InstalledEntry> {
        let state = self.store.load()?;
        let mutation = mutate::install(self.vcs.as_ref(), &self.catalog, &state, name, root, bar)?;
        self.store.save(&mutation.state)?;

        Ok(mutation.entry)
    }

    /// Update every tracked mod.
    ///
    /// The state document is never written.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded.
    #[instrument(skip(self), level = "debug")]
    pub async fn update(&self, options: UpdateOptions) -> Result<Vec<UpdateOutcome>> {
        let state = self.store.load()?;
        Ok(mutate::update(Arc::clone(&self.vcs), &state, options).await)
    }

    /// Uninstall catalog mod.
    ///
    /// # Errors
    ///
    /// - Return [`ManagerError::Store`] if the state document cannot be
    ///   loaded or saved.
    /// - Return [`ManagerError::Mod`] if removal fails.
    #[instrument(skip(self), level = "debug")]
    pub fn uninstall(&self, name: &str) -> Result<InstalledEntry> {
        let state = self.store.load()?;
        let mutation = mutate::uninstall(self.vcs.as_ref(), &self.catalog, &state, name)?;
        self.store.save(&mutation.state)?;

        Ok(mutation.entry)
    }
}

/// Mod manager error types.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Mod(#[from] ModError),
}

/// Friendly result alias :3
pub type Result<T, E = ManagerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mutate::tests::catalog, reconcile::Classification, vcs::fake::FakeVcs};
    use pretty_assertions::assert_eq;

    fn manager(state_dir: &Path) -> ModManager<FakeVcs> {
        ModManager::new(
            catalog(),
            StateStore::new(state_dir.join("state.toml")),
            FakeVcs::new(),
        )
    }

    #[tokio::test]
    async fn install_then_check_tracks_mod_once() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let config = tempfile::tempdir()?;
        let manager = manager(config.path());

        manager.install("rjw", root.path(), ProgressBar::hidden())?;
        let result = manager.check(root.path()).await?;

        assert_eq!(result.state.installed_mods.len(), 1);
        assert_eq!(
            result.classified(Classification::KnownInstalled).count(),
            1
        );
        assert_eq!(manager.state()?, result.state);

        Ok(())
    }

    #[tokio::test]
    async fn install_twice_leaves_store_unchanged() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let config = tempfile::tempdir()?;
        let manager = manager(config.path());

        manager.install("rjw", root.path(), ProgressBar::hidden())?;
        let before = manager.state()?;
        let result = manager.install("rjw", root.path(), ProgressBar::hidden());

        assert!(matches!(
            result,
            Err(ManagerError::Mod(ModError::AlreadyInstalled { .. }))
        ));
        assert_eq!(manager.state()?, before);

        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_store_and_uninstall_drops_entry() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let config = tempfile::tempdir()?;
        let manager = manager(config.path());

        manager.install("rjw", root.path(), ProgressBar::hidden())?;
        manager.install("rjw-ex", root.path(), ProgressBar::hidden())?;
        let before = manager.state()?;

        let outcomes = manager.update(UpdateOptions::default()).await?;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(manager.state()?, before);

        let installable = manager
            .installable()?
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect::<Vec<_>>();
        assert!(installable.is_empty());

        manager.uninstall("rjw")?;
        let names = manager
            .state()?
            .installed_mods
            .into_iter()
            .map(|entry| entry.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["rjw-ex"]);
        assert_eq!(manager.installable()?.len(), 1);

        Ok(())
    }
}
