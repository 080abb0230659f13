// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! State store persistence.
//!
//! Lazymod keeps a single [`StateDocument`] on disk between runs. The document
//! is always read and written whole. Writes go to a sibling temporary file
//! that is renamed over the original, so a crash mid-write never leaves a
//! truncated document behind.
//!
//! There is no locking. Running two instances of lazymod against the same
//! state document at the same time can lose updates.

use crate::config::{ConfigError, StateDocument};

use std::{
    fs::{read_to_string, rename, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Handle to state document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Construct new state store handle.
    ///
    /// Does not touch the file system.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to state document.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Load state document.
    ///
    /// A missing state document loads as an empty one.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Read`] if the document exists but cannot be
    ///   read.
    /// - Return [`StoreError::Config`] if the document is malformed.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self) -> Result<StateDocument> {
        match read_to_string(&self.path) {
            Ok(content) => Ok(content.parse()?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no state document at {:?}", self.path.display());
                Ok(StateDocument::default())
            }
            Err(err) => Err(StoreError::Read {
                source: err,
                path: self.path.clone(),
            }),
        }
    }

    /// Save state document.
    ///
    /// Creates parent directories when missing.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Config`] if document cannot be serialized.
    /// - Return [`StoreError::Write`] if document cannot be written.
    #[instrument(skip(self, document), level = "debug")]
    pub fn save(&self, document: &StateDocument) -> Result<()> {
        let content = toml::ser::to_string_pretty(document).map_err(ConfigError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            mkdirp::mkdirp(parent).map_err(|err| self.write_error(err))?;
        }

        // INVARIANT: Replace document in one step.
        let staging = self.staging_path();
        write(&staging, content.as_bytes()).map_err(|err| self.write_error(err))?;
        rename(&staging, &self.path).map_err(|err| self.write_error(err))?;
        debug!(
            "saved {} installed mods to {:?}",
            document.installed_mods.len(),
            self.path.display()
        );

        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            source,
            path: self.path.clone(),
        }
    }
}

/// State store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// State document cannot be read.
    #[error("failed to read state document at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// State document cannot be written.
    #[error("failed to write state document at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// State document cannot be parsed or serialized.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
