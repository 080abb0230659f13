// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod removal.

use crate::{
    catalog::Catalog,
    config::StateDocument,
    mutate::{ModError, Mutation, Result},
    vcs::VersionControl,
};

use tracing::{debug, info, instrument};

/// Uninstall catalog mod.
///
/// Removes the checkout's Git metadata first and its directory second. A crash
/// between both steps leaves an inert plain directory, never a broken
/// checkout that update would trip over. The mod stays registered unless both
/// steps succeed. Steps whose target no longer exists are skipped, so an
/// interrupted uninstall can simply be retried.
///
/// # Errors
///
/// - Return [`ModError::UnknownMod`] if name is not in catalog.
/// - Return [`ModError::NotInstalled`] if the mod's remote is not tracked.
/// - Return [`ModError::RemovalFailed`] if either removal step fails.
#[instrument(skip(vcs, catalog, state), level = "debug")]
pub fn uninstall<V>(vcs: &V, catalog: &Catalog, state: &StateDocument, name: &str) -> Result<Mutation>
where
    V: VersionControl + ?Sized,
{
    let entry = catalog
        .find_by_name(name)
        .ok_or_else(|| ModError::UnknownMod { name: name.into() })?;
    let installed = state
        .find_by_remote(&entry.remote)
        .ok_or_else(|| ModError::NotInstalled { name: name.into() })?;

    let dir = installed.dir.as_path();
    for path in [dir.join(".git"), dir.to_path_buf()] {
        // INVARIANT: Steps finished by an earlier attempt count as done.
        if !path.exists() {
            debug!("{:?} is already gone", path.display());
            continue;
        }

        vcs.remove(&path).map_err(|err| ModError::RemovalFailed {
            source: err,
            dir: dir.to_path_buf(),
        })?;
    }

    let mut next = state.clone();
    let removed = next
        .deregister(&entry.remote)
        .ok_or_else(|| ModError::NotInstalled { name: name.into() })?;
    info!("uninstalled {name} from {:?}", dir.display());

    Ok(Mutation {
        state: next,
        entry: removed,
    })
}
