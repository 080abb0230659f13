// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository probe.
//!
//! Inspect a single directory entry and decide whether it is a trackable mod
//! checkout. Any failure along the way means the entry is not trackable. The
//! caller is expected to skip it rather than abort.

use crate::vcs::{VcsError, VersionControl};

use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Successful probe of a checkout.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Fetch URL of primary remote.
    pub remote: String,

    /// Commit id HEAD currently points at.
    pub revision: String,
}

/// Probe directory for a trackable checkout.
///
/// Refreshes remote tracking state first, then reads the primary remote and
/// the current revision.
///
/// # Errors
///
/// - Return [`ProbeError`] if the directory is not a checkout, cannot be
///   fetched, or has no remote.
#[instrument(skip(vcs, dir), level = "debug")]
pub fn probe<V>(vcs: &V, dir: impl AsRef<Path>) -> Result<Probe>
where
    V: VersionControl + ?Sized,
{
    let dir = dir.as_ref();
    let failed = |source| ProbeError {
        dir: dir.to_path_buf(),
        source,
    };

    vcs.fetch(dir).map_err(failed)?;
    let remote = vcs
        .remotes(dir)
        .map_err(failed)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            failed(VcsError::NoRemote {
                dir: dir.to_path_buf(),
            })
        })?;
    let revision = vcs.revparse(dir, "HEAD").map_err(failed)?;
    debug!("{:?} tracks {remote} at {revision}", dir.display());

    Ok(Probe { remote, revision })
}

/// Directory entry is not a trackable checkout.
#[derive(Debug, thiserror::Error)]
#[error("{:?} is not a trackable mod checkout", dir.display())]
pub struct ProbeError {
    #[source]
    pub source: VcsError,
    pub dir: PathBuf,
}

/// Friendly result alias :3
pub type Result<T, E = ProbeError> = std::result::Result<T, E>;
