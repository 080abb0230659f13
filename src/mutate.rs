// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod mutation.
//!
//! Operations that change what is installed in the installation directory:
//! [`install`], [`update`], and [`uninstall`].
//!
//! None of these touch the state document on disk. Install and uninstall take
//! the current [`StateDocument`] and hand back the next one as part of a
//! [`Mutation`] only after the file system change went through, so a failure
//! never leaves a half-registered mod behind. Update never changes the state
//! document at all.
//!
//! [`StateDocument`]: crate::config::StateDocument

pub mod install;
pub mod uninstall;
pub mod update;

pub use install::install;
pub use uninstall::uninstall;
pub use update::{update, UpdateOptions, UpdateOutcome, UpdateStatus};

use crate::{
    config::{InstalledEntry, StateDocument},
    vcs::VcsError,
};

use std::path::{Path, PathBuf};

/// Result of a successful install or uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// State document to persist.
    pub state: StateDocument,

    /// Entry that was registered or deregistered.
    pub entry: InstalledEntry,
}

/// Shell command that finishes removing a checkout by hand.
pub fn manual_cleanup_command(dir: impl AsRef<Path>) -> String {
    format!(
        "rm -rf {:?} && rm -rf {:?}",
        dir.as_ref().join(".git").display(),
        dir.as_ref().display()
    )
}

/// Mod mutation error types.
#[derive(Debug, thiserror::Error)]
pub enum ModError {
    /// Name does not match any catalog entry.
    #[error("mod {name:?} is not a known mod")]
    UnknownMod { name: String },

    /// Catalog entry is already tracked.
    #[error("mod {name:?} is already installed at {:?}", dir.display())]
    AlreadyInstalled { name: String, dir: PathBuf },

    /// Target directory is not the tracked installation directory.
    #[error(
        "{:?} is not the installation directory {:?}, rescan it with: lazymod --dir {:?} list",
        root.display(),
        installation_dir.display(),
        root.display()
    )]
    ForeignRoot {
        root: PathBuf,
        installation_dir: PathBuf,
    },

    /// Catalog entry is not tracked.
    #[error("mod {name:?} is not installed")]
    NotInstalled { name: String },

    /// Cloning the mod failed.
    #[error("failed to install {name:?} into {:?}", dir.display())]
    CloneFailed {
        #[source]
        source: VcsError,
        name: String,
        dir: PathBuf,
    },

    /// Removing the checkout failed part way.
    #[error(
        "failed to uninstall {:?}, remove it manually with: {}",
        dir.display(),
        manual_cleanup_command(dir)
    )]
    RemovalFailed {
        #[source]
        source: VcsError,
        dir: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ModError> = std::result::Result<T, E>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogEntry};
    use pretty_assertions::assert_eq;

    pub(crate) fn catalog() -> Catalog {
        Catalog::new([
            CatalogEntry {
                name: "rjw".into(),
                remote: "https://x/rjw.git".into(),
                label: "RJW".into(),
                ..Default::default()
            },
            CatalogEntry {
                name: "rjw-ex".into(),
                remote: "https://x/rjw-ex.git".into(),
                label: "RJW Extension".into(),
                deprecated: true,
                remark: None,
            },
        ])
        .unwrap()
    }

    #[test]
    fn cleanup_command_removes_metadata_first() {
        let result = manual_cleanup_command("/mods/rjw");
        assert_eq!(result, r#"rm -rf "/mods/rjw/.git" && rm -rf "/mods/rjw""#);
    }
}
