// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod updates.
//!
//! Every tracked mod is fetched and fast-forwarded independently. Failure of
//! one mod never stops the others, so the batch as a whole cannot fail. The
//! caller receives one [`UpdateOutcome`] per tracked mod instead.

use crate::{
    config::{InstalledEntry, StateDocument},
    vcs::{LogEntry, VcsError, VersionControl, HISTORY_DEPTH},
};

use futures::future::join_all;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task::{spawn_blocking, JoinError};
use tracing::{info, instrument, warn};

/// Knobs for history display after update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Collect recent history of every mod.
    pub show_log: bool,

    /// Collect recent history of mods that changed.
    pub show_only_changed_log: bool,
}

impl UpdateOptions {
    fn wants_log(&self, status: &UpdateStatus) -> bool {
        self.show_log || (self.show_only_changed_log && status.is_updated())
    }
}

/// What an update did to a single mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Revision moved.
    Updated { from: String, to: String },

    /// Revision stayed the same.
    UpToDate,
}

impl UpdateStatus {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Update outcome of a single mod.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// Directory name of mod.
    pub name: String,

    /// Absolute path to mod checkout.
    pub dir: PathBuf,

    pub result: Result<UpdateStatus, UpdateError>,

    /// Recent history, newest first, when requested.
    pub log: Vec<LogEntry>,
}

/// Update every tracked mod.
///
/// Mods are processed concurrently, and outcomes are returned sorted by mod
/// name. The state document is only read.
#[instrument(skip(vcs, state), level = "debug")]
pub async fn update<V>(vcs: Arc<V>, state: &StateDocument, options: UpdateOptions) -> Vec<UpdateOutcome>
where
    V: VersionControl,
{
    let mut entries = state.installed_mods.clone();
    entries.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));

    let tasks = entries.into_iter().map(|InstalledEntry { name, dir, .. }| {
        let vcs = Arc::clone(&vcs);
        async move {
            let task_dir = dir.clone();
            let joined = spawn_blocking(move || update_checkout(vcs.as_ref(), &task_dir, options)).await;

            let (result, log) = match joined {
                Ok(Ok((status, log))) => (Ok(status), log),
                Ok(Err(err)) => (
                    Err(UpdateError::Vcs {
                        source: err,
                        dir: dir.clone(),
                    }),
                    Vec::new(),
                ),
                Err(err) => (
                    Err(UpdateError::Interrupted {
                        source: err,
                        dir: dir.clone(),
                    }),
                    Vec::new(),
                ),
            };

            match &result {
                Ok(UpdateStatus::Updated { .. }) => info!("updated {name}"),
                Ok(UpdateStatus::UpToDate) => info!("{name} is up to date"),
                Err(err) => warn!("failed to update {name}: {err}"),
            }

            UpdateOutcome {
                name,
                dir,
                result,
                log,
            }
        }
    });

    join_all(tasks).await
}

fn update_checkout<V>(
    vcs: &V,
    dir: &Path,
    options: UpdateOptions,
) -> Result<(UpdateStatus, Vec<LogEntry>), VcsError>
where
    V: VersionControl + ?Sized,
{
    let current = vcs.revparse(dir, "HEAD")?;
    vcs.fetch(dir)?;
    vcs.pull(dir)?;
    let resulting = vcs.revparse(dir, "HEAD")?;

    let status = if current != resulting {
        UpdateStatus::Updated {
            from: current,
            to: resulting,
        }
    } else {
        UpdateStatus::UpToDate
    };

    let log = if options.wants_log(&status) {
        vcs.log(dir, HISTORY_DEPTH).unwrap_or_else(|err| {
            warn!("cannot read history of {:?}: {err}", dir.display());
            Vec::new()
        })
    } else {
        Vec::new()
    };

    Ok((status, log))
}

/// Update error types.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Fetching or merging failed.
    #[error("failed to update, please check the git repo at {:?}", dir.display())]
    Vcs {
        #[source]
        source: VcsError,
        dir: PathBuf,
    },

    /// Update task panicked or was cancelled.
    #[error("update of {:?} did not finish", dir.display())]
    Interrupted {
        #[source]
        source: JoinError,
        dir: PathBuf,
    },
}
