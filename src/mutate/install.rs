// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod installation.

use crate::{
    catalog::Catalog,
    config::{InstalledEntry, StateDocument},
    mutate::{ModError, Mutation, Result},
    vcs::VersionControl,
    versions::supported_versions,
};

use indicatif::ProgressBar;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Install catalog mod into installation directory.
///
/// Clones the mod into a directory named after the requested mod, and
/// registers it in the returned state document. Installation never
/// overwrites a mod that is already tracked, and never installs outside of
/// the tracked installation directory.
///
/// # Errors
///
/// - Return [`ModError::UnknownMod`] if name is not in catalog.
/// - Return [`ModError::AlreadyInstalled`] if the mod's remote is tracked.
/// - Return [`ModError::ForeignRoot`] if root differs from the tracked
///   installation directory.
/// - Return [`ModError::CloneFailed`] if cloning fails.
#[instrument(skip(vcs, catalog, state, bar), level = "debug")]
pub fn install<V>(
    vcs: &V,
    catalog: &Catalog,
    state: &StateDocument,
    name: &str,
    root: &Path,
    bar: ProgressBar,
) -> Result<Mutation>
where
    V: VersionControl + ?Sized,
{
    let entry = catalog
        .find_by_name(name)
        .ok_or_else(|| ModError::UnknownMod { name: name.into() })?;

    if let Some(existing) = state.find_by_remote(&entry.remote) {
        return Err(ModError::AlreadyInstalled {
            name: name.into(),
            dir: existing.dir.clone(),
        });
    }

    // INVARIANT: Mods only ever live in the tracked installation directory.
    if let Some(installation_dir) = &state.installation_dir {
        if installation_dir != root {
            return Err(ModError::ForeignRoot {
                root: root.to_path_buf(),
                installation_dir: installation_dir.clone(),
            });
        }
    }

    if entry.deprecated {
        warn!("{} is deprecated", entry.label);
    }

    let dir = root.join(name);
    vcs.clone_into(&entry.remote, &dir, bar)
        .map_err(|err| ModError::CloneFailed {
            source: err,
            name: name.into(),
            dir: dir.clone(),
        })?;

    // INVARIANT: Register only after the clone exists on disk.
    let installed = InstalledEntry {
        name: name.into(),
        mod_name: entry.name.clone(),
        versions: supported_versions(&dir).unwrap_or_default(),
        dir,
        remote: entry.remote.clone(),
    };
    let mut next = state.clone();
    next.installation_dir = Some(root.to_path_buf());
    next.register(installed.clone());
    info!("installed {name}");

    Ok(Mutation {
        state: next,
        entry: installed,
    })
}
