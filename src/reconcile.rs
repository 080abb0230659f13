// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Installation directory reconciliation.
//!
//! Reconciliation derives a fresh [`StateDocument`] from what actually lives
//! in the installation directory instead of trusting whatever was persisted
//! last time. Every immediate child of the installation directory is probed
//! as a possible mod checkout, and each successful probe is cross-referenced
//! against the [`Catalog`] and the prior state document.
//!
//! # Replacement Semantics
//!
//! The resulting document replaces the prior one wholesale. A mod whose
//! directory vanished is not carried over. It only shows up in the
//! [`Reconciliation`] report as [`Classification::Missing`] so the user can
//! see what was dropped. A checkout whose remote left the catalog is reported
//! as [`Classification::Unknown`] instead.
//!
//! # Concurrency
//!
//! Probes are independent of each other and run as blocking tasks on the
//! tokio runtime. A probe that fails, panics, or is cancelled only drops its
//! own entry.

use crate::{
    catalog::{same_remote, Catalog},
    config::{InstalledEntry, StateDocument},
    probe::{probe, Probe},
    vcs::VersionControl,
    versions::supported_versions,
};

use futures::future::join_all;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_dir,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument, warn};

/// Stray file some platforms leave behind in synced folders.
const ICON_ARTIFACT: &str = "Icon\r";

/// How a directory entry relates to catalog and prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Known mod that was already tracked.
    KnownInstalled,

    /// Known mod that was not tracked before.
    NewlyDiscovered,

    /// Checkout whose remote is not in the catalog.
    Unknown,

    /// Additional checkout of a remote that is already tracked.
    Duplicate,

    /// Previously tracked mod that could not be found again.
    Missing,
}

impl Display for Classification {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::KnownInstalled => "installed",
            Self::NewlyDiscovered => "new",
            Self::Unknown => "unknown",
            Self::Duplicate => "duplicate",
            Self::Missing => "missing",
        };
        fmt.write_str(label)
    }
}

/// Single classified entry of a reconciliation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Directory name of entry.
    pub name: String,

    /// Absolute path to entry.
    pub dir: PathBuf,

    /// Remote the entry tracks.
    pub remote: String,

    pub classification: Classification,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Refreshed state document.
    pub state: StateDocument,

    /// Classified entries in directory order, followed by missing entries.
    pub report: Vec<ReportEntry>,
}

impl Reconciliation {
    /// Iterate through report entries of a given classification.
    pub fn classified(&self, classification: Classification) -> impl Iterator<Item = &ReportEntry> {
        self.report
            .iter()
            .filter(move |entry| entry.classification == classification)
    }
}

/// Check if directory entry name is worth probing.
///
/// Skips hidden entries, the stray `Icon\r` artifact, and anything that looks
/// like a text file.
pub fn is_candidate(name: &str) -> bool {
    !(name.starts_with('.') || name == ICON_ARTIFACT || name.contains(".txt"))
}

/// Reconcile installation directory against catalog and prior state.
///
/// # Errors
///
/// - Return [`ReconcileError::DirectoryListFailed`] if the installation
///   directory itself cannot be listed. Failures of individual entries are
///   never reported as errors.
#[instrument(skip(catalog, prior, vcs), level = "debug")]
pub async fn reconcile<V>(
    root: &Path,
    catalog: &Catalog,
    prior: &StateDocument,
    vcs: Arc<V>,
) -> Result<Reconciliation>
where
    V: VersionControl,
{
    let list_failed = |source| ReconcileError::DirectoryListFailed {
        source,
        path: root.to_path_buf(),
    };

    let mut candidates = Vec::new();
    for entry in read_dir(root).map_err(list_failed)? {
        let entry = entry.map_err(list_failed)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_candidate(&name) {
            candidates.push((name, entry.path()));
        } else {
            debug!("skip {name:?}");
        }
    }

    let probes = candidates.into_iter().map(|(name, dir)| {
        let vcs = Arc::clone(&vcs);
        async move {
            let task_dir = dir.clone();
            let outcome = spawn_blocking(move || {
                let probe = probe(vcs.as_ref(), &task_dir)?;
                let versions = supported_versions(&task_dir).unwrap_or_else(|err| {
                    debug!("no supported versions for {:?}: {err}", task_dir.display());
                    Vec::new()
                });
                Ok::<_, crate::probe::ProbeError>((probe, versions))
            })
            .await;

            match outcome {
                Ok(Ok((probe, versions))) => Some((name, dir, probe, versions)),
                Ok(Err(err)) => {
                    debug!("{err}");
                    None
                }
                Err(err) => {
                    warn!("probe of {:?} did not finish: {err}", dir.display());
                    None
                }
            }
        }
    });
    let probed = join_all(probes).await;

    let mut state = StateDocument {
        installation_dir: Some(root.to_path_buf()),
        installed_mods: Vec::new(),
    };
    let mut report = Vec::new();
    for (name, dir, Probe { remote, .. }, versions) in probed.into_iter().flatten() {
        let classification = match catalog.find_by_remote(&remote) {
            None => Classification::Unknown,
            Some(_) if state.is_installed(&remote) => Classification::Duplicate,
            Some(entry) => {
                state.register(InstalledEntry {
                    name: name.clone(),
                    mod_name: entry.name.clone(),
                    dir: dir.clone(),
                    remote: remote.clone(),
                    versions,
                });

                if prior.is_installed(&remote) {
                    Classification::KnownInstalled
                } else {
                    Classification::NewlyDiscovered
                }
            }
        };

        report.push(ReportEntry {
            name,
            dir,
            remote,
            classification,
        });
    }

    for entry in &prior.installed_mods {
        // INVARIANT: Report every remote at most once.
        let reported = report
            .iter()
            .any(|seen| same_remote(&seen.remote, &entry.remote));
        if !reported {
            report.push(ReportEntry {
                name: entry.name.clone(),
                dir: entry.dir.clone(),
                remote: entry.remote.clone(),
                classification: Classification::Missing,
            });
        }
    }

    info!(
        "found {} mods in {:?}",
        state.installed_mods.len(),
        root.display()
    );

    Ok(Reconciliation { state, report })
}

/// Reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Installation directory cannot be listed.
    #[error("failed to list installation directory {:?}", path.display())]
    DirectoryListFailed {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
