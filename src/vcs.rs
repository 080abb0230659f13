// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control access.
//!
//! Every mod is a Git checkout. All interaction with those checkouts, and the
//! removal of checkout directories, flows through the [`VersionControl`]
//! trait so the reconciliation and mutation logic never touches libgit2
//! directly. [`Git2Vcs`] is the real implementation.
//!
//! All operations are scoped to a single directory, and may be called from
//! several blocking tasks at once as long as no two tasks share a directory.

#[cfg(test)]
pub(crate) mod fake;

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Branch, Config, ErrorCode, FetchOptions, Remote, RemoteCallbacks, Repository, Sort,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument};

/// Number of history entries shown after an update.
pub const HISTORY_DEPTH: usize = 5;

/// Single commit of a checkout's history.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Abbreviated commit hash.
    pub hash: String,

    /// First line of commit message.
    pub message: String,
}

/// Layer of indirection for version control access.
pub trait VersionControl: Send + Sync + 'static {
    /// Refresh remote tracking state of checkout from its primary remote.
    fn fetch(&self, dir: &Path) -> Result<()>;

    /// List fetch URLs of configured remotes, primary remote first.
    fn remotes(&self, dir: &Path) -> Result<Vec<String>>;

    /// Clone remote repository into target directory.
    fn clone_into(&self, remote: &str, dir: &Path, bar: ProgressBar) -> Result<()>;

    /// Bring current branch up to its already fetched upstream.
    fn pull(&self, dir: &Path) -> Result<()>;

    /// Resolve revision specification to a commit id.
    fn revparse(&self, dir: &Path, spec: &str) -> Result<String>;

    /// List most recent commits reachable from HEAD, newest first.
    fn log(&self, dir: &Path, max_count: usize) -> Result<Vec<LogEntry>>;

    /// Remove file system entry recursively.
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Version control access through libgit2.
#[derive(Debug, Default, Clone)]
pub struct Git2Vcs;

impl Git2Vcs {
    /// Construct new libgit2 access.
    pub fn new() -> Self {
        Self
    }

    fn open(dir: &Path) -> Result<Repository> {
        Repository::open(dir).map_err(|err| VcsError::NotARepository {
            source: err,
            dir: dir.to_path_buf(),
        })
    }

    fn primary_remote<'repo>(repository: &'repo Repository, dir: &Path) -> Result<Remote<'repo>> {
        let names = repository.remotes()?;
        let name = names
            .iter()
            .flatten()
            .next()
            .ok_or_else(|| VcsError::NoRemote {
                dir: dir.to_path_buf(),
            })?;

        Ok(repository.find_remote(name)?)
    }
}

impl VersionControl for Git2Vcs {
    #[instrument(skip(self), level = "debug")]
    fn fetch(&self, dir: &Path) -> Result<()> {
        let repository = Self::open(dir)?;
        let mut remote = Self::primary_remote(&repository, dir)?;
        debug!("fetch {:?} from {:?}", dir.display(), remote.url());

        let authenticator = GitAuthenticator::default();
        let config = Config::open_default()?;
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);

        // INVARIANT: Use configured refspecs of remote.
        remote.fetch(&[] as &[&str], Some(&mut fo), None)?;

        Ok(())
    }

    fn remotes(&self, dir: &Path) -> Result<Vec<String>> {
        let repository = Self::open(dir)?;
        let names = repository.remotes()?;
        let mut urls = Vec::new();
        for name in names.iter().flatten() {
            let remote = repository.find_remote(name)?;
            if let Some(url) = remote.url() {
                urls.push(url.to_string());
            }
        }

        Ok(urls)
    }

    /// Clone remote repository into target directory.
    ///
    /// The progress of the clone is displayed through a progress bar. If any
    /// credentials are required for the clone to continue, then the user will
    /// be prompted for that information accordingly. The progress bar will be
    /// blocked for user input.
    #[instrument(skip(self, bar), level = "debug")]
    fn clone_into(&self, remote: &str, dir: &Path, bar: ProgressBar) -> Result<()> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(remote.to_string());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = IndicatifPrompter::new(bar);
        let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
        let config = Config::open_default()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(|progress| {
            let stats = progress.to_owned();
            let bar_size = stats.total_objects() as u64;
            let bar_pos = stats.received_objects() as u64;
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                prompter.bar.set_length(bar_size);
                prompter.bar.set_position(bar_pos);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        let result = RepoBuilder::new().fetch_options(fo).clone(remote, dir);
        prompter.bar.finish_and_clear();
        result?;
        info!("cloned {remote} into {:?}", dir.display());

        Ok(())
    }

    /// Fast-forward current branch to its upstream.
    ///
    /// Checkouts whose branch has diverged from upstream are left alone and
    /// reported as [`VcsError::Diverged`]. Local edits that upstream also
    /// changed are never overwritten, and reported as
    /// [`VcsError::LocalChanges`].
    #[instrument(skip(self), level = "debug")]
    fn pull(&self, dir: &Path) -> Result<()> {
        let repository = Self::open(dir)?;
        let head = repository.head()?;
        if !head.is_branch() {
            return Err(VcsError::DetachedHead {
                dir: dir.to_path_buf(),
            });
        }

        let branch = Branch::wrap(head);
        let no_upstream = || VcsError::NoUpstream {
            dir: dir.to_path_buf(),
        };
        let upstream = branch.upstream().map_err(|_| no_upstream())?;
        let target = upstream.get().target().ok_or_else(no_upstream)?;
        let incoming = repository.find_annotated_commit(target)?;

        let (analysis, _) = repository.merge_analysis(&[&incoming])?;
        if analysis.is_up_to_date() {
            debug!("{:?} is up to date", dir.display());
            return Ok(());
        }

        if !analysis.is_fast_forward() {
            return Err(VcsError::Diverged {
                dir: dir.to_path_buf(),
            });
        }

        // INVARIANT: Move branch only after the work tree reached the target.
        //   - Safe checkout keeps local edits to files upstream left alone.
        let commit = repository.find_commit(target)?;
        repository
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|err| match err.code() {
                ErrorCode::Conflict => VcsError::LocalChanges {
                    dir: dir.to_path_buf(),
                },
                _ => VcsError::Git2(err),
            })?;

        let mut reference = branch.into_reference();
        reference.set_target(target, "lazymod: fast-forward")?;

        Ok(())
    }

    fn revparse(&self, dir: &Path, spec: &str) -> Result<String> {
        let repository = Self::open(dir)?;
        let object = repository.revparse_single(spec)?;

        Ok(object.id().to_string())
    }

    fn log(&self, dir: &Path, max_count: usize) -> Result<Vec<LogEntry>> {
        let repository = Self::open(dir)?;
        let mut walk = repository.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push_head()?;

        let mut entries = Vec::new();
        for oid in walk.take(max_count) {
            let commit = repository.find_commit(oid?)?;
            let short_id = commit.as_object().short_id()?;
            entries.push(LogEntry {
                hash: short_id.as_str().unwrap_or_default().to_string(),
                message: commit.summary().unwrap_or_default().to_string(),
            });
        }

        Ok(entries)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        debug!("remove {:?}", path.display());
        remove_dir_all(path).map_err(|err| VcsError::Remove {
            source: err,
            path: path.to_path_buf(),
        })
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Directory is not a Git checkout.
    #[error("{:?} is not a git repository", dir.display())]
    NotARepository {
        #[source]
        source: git2::Error,
        dir: PathBuf,
    },

    /// Checkout has no remotes configured.
    #[error("{:?} has no remotes configured", dir.display())]
    NoRemote { dir: PathBuf },

    /// Checkout is not on a branch.
    #[error("{:?} is not on a branch", dir.display())]
    DetachedHead { dir: PathBuf },

    /// Current branch does not track an upstream branch.
    #[error("current branch of {:?} has no upstream", dir.display())]
    NoUpstream { dir: PathBuf },

    /// Current branch cannot be fast-forwarded to its upstream.
    #[error("current branch of {:?} has diverged from upstream", dir.display())]
    Diverged { dir: PathBuf },

    /// Local edits conflict with incoming upstream changes.
    #[error("local changes in {:?} would be overwritten by update", dir.display())]
    LocalChanges { dir: PathBuf },

    /// File system entry cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
