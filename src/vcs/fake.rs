// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory version control for unit tests.
//!
//! Checkouts are real directories with an empty `.git` directory inside, but
//! their remotes and revisions only live in memory. Revisions are counters
//! that move forward when a new upstream revision is published.

use crate::{
    catalog::normalize_remote,
    vcs::{LogEntry, Result, VcsError, VersionControl},
};

use indicatif::ProgressBar;
use std::{
    collections::{HashMap, HashSet},
    fs::{create_dir_all, remove_dir_all},
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
    sync::Mutex,
};

#[derive(Debug, Clone)]
struct FakeCheckout {
    remotes: Vec<String>,
    revision: usize,
}

#[derive(Debug, Default)]
pub(crate) struct FakeVcs {
    checkouts: Mutex<HashMap<PathBuf, FakeCheckout>>,
    upstreams: Mutex<HashMap<String, usize>>,
    unreachable: Mutex<HashSet<String>>,
    stubborn: Mutex<HashSet<PathBuf>>,
    removed: Mutex<Vec<PathBuf>>,
}

impl FakeVcs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create checkout directory on disk tracking the given remotes.
    pub(crate) fn add_checkout(&self, dir: &Path, remotes: &[&str]) {
        create_dir_all(dir.join(".git")).unwrap();
        let revision = remotes
            .first()
            .map(|remote| self.upstream(remote))
            .unwrap_or_default();
        self.checkouts.lock().unwrap().insert(
            dir.to_path_buf(),
            FakeCheckout {
                remotes: remotes.iter().map(ToString::to_string).collect(),
                revision,
            },
        );
    }

    /// Push a new upstream revision to remote.
    pub(crate) fn publish(&self, remote: &str) {
        *self
            .upstreams
            .lock()
            .unwrap()
            .entry(normalize_remote(remote).to_string())
            .or_default() += 1;
    }

    pub(crate) fn set_unreachable(&self, remote: &str) {
        self.unreachable
            .lock()
            .unwrap()
            .insert(normalize_remote(remote).to_string());
    }

    /// Make removal of path fail.
    pub(crate) fn refuse_removal(&self, path: &Path) {
        self.stubborn.lock().unwrap().insert(path.to_path_buf());
    }

    pub(crate) fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }

    pub(crate) fn is_checkout(&self, dir: &Path) -> bool {
        self.checkouts.lock().unwrap().contains_key(dir)
    }

    fn upstream(&self, remote: &str) -> usize {
        self.upstreams
            .lock()
            .unwrap()
            .get(normalize_remote(remote))
            .copied()
            .unwrap_or_default()
    }

    fn checkout(&self, dir: &Path) -> Result<FakeCheckout> {
        self.checkouts
            .lock()
            .unwrap()
            .get(dir)
            .cloned()
            .ok_or_else(|| VcsError::NotARepository {
                source: git2::Error::from_str("could not find repository"),
                dir: dir.to_path_buf(),
            })
    }

    fn primary_remote(&self, dir: &Path) -> Result<String> {
        self.checkout(dir)?
            .remotes
            .first()
            .cloned()
            .ok_or_else(|| VcsError::NoRemote {
                dir: dir.to_path_buf(),
            })
    }

    fn reach(&self, remote: &str) -> Result<()> {
        if self
            .unreachable
            .lock()
            .unwrap()
            .contains(normalize_remote(remote))
        {
            return Err(VcsError::Git2(git2::Error::from_str(&format!(
                "failed to resolve address for {remote}"
            ))));
        }

        Ok(())
    }
}

impl VersionControl for FakeVcs {
    fn fetch(&self, dir: &Path) -> Result<()> {
        let remote = self.primary_remote(dir)?;
        self.reach(&remote)
    }

    fn remotes(&self, dir: &Path) -> Result<Vec<String>> {
        Ok(self.checkout(dir)?.remotes)
    }

    fn clone_into(&self, remote: &str, dir: &Path, _bar: ProgressBar) -> Result<()> {
        self.reach(remote)?;
        if dir.exists() {
            return Err(VcsError::Git2(git2::Error::from_str(&format!(
                "'{}' exists and is not an empty directory",
                dir.display()
            ))));
        }

        self.add_checkout(dir, &[remote]);
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<()> {
        let remote = self.primary_remote(dir)?;
        let upstream = self.upstream(&remote);
        if let Some(checkout) = self.checkouts.lock().unwrap().get_mut(dir) {
            checkout.revision = upstream;
        }

        Ok(())
    }

    fn revparse(&self, dir: &Path, _spec: &str) -> Result<String> {
        Ok(format!("rev-{}", self.checkout(dir)?.revision))
    }

    fn log(&self, dir: &Path, max_count: usize) -> Result<Vec<LogEntry>> {
        let revision = self.checkout(dir)?.revision;
        Ok((0..=revision)
            .rev()
            .take(max_count)
            .map(|rev| LogEntry {
                hash: format!("rev-{rev}"),
                message: format!("change {rev}"),
            })
            .collect())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if self.stubborn.lock().unwrap().contains(path) {
            return Err(VcsError::Remove {
                source: IoError::new(ErrorKind::PermissionDenied, "file in use"),
                path: path.to_path_buf(),
            });
        }

        remove_dir_all(path).map_err(|err| VcsError::Remove {
            source: err,
            path: path.to_path_buf(),
        })?;

        // INVARIANT: Checkout stops being one once its metadata is gone.
        if path.file_name().is_some_and(|name| name == ".git") {
            if let Some(dir) = path.parent() {
                self.checkouts.lock().unwrap().remove(dir);
            }
        }
        self.removed.lock().unwrap().push(path.to_path_buf());

        Ok(())
    }
}
