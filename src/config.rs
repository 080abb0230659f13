// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the state document that lazymod persists between
//! runs to simplify the process of serialization and deserialization. File
//! I/O is left to [`StateStore`](crate::store::StateStore).

use crate::catalog::same_remote;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// State document layout.
///
/// Records the last installation directory that was scanned, and every mod
/// that lazymod currently tracks in it.
///
/// # General Layout
///
/// ```toml
/// installation-dir = "~/.steam/steam/steamapps/common/RimWorld/Mods"
///
/// [[installed-mods]]
/// name = "rjw"
/// mod = "rjw"
/// dir = "/home/user/.steam/steam/steamapps/common/RimWorld/Mods/rjw"
/// remote = "https://gitgud.io/Ed86/rjw.git"
/// versions = ["1.4", "1.5"]
/// ```
///
/// # Invariant
///
/// - Installed entries are unique by normalized remote.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateDocument {
    /// Last known installation directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_dir: Option<PathBuf>,

    /// Mods currently tracked.
    #[serde(default)]
    pub installed_mods: Vec<InstalledEntry>,
}

impl StateDocument {
    /// Find installed entry by remote, comparing normalized remotes.
    pub fn find_by_remote(&self, remote: impl AsRef<str>) -> Option<&InstalledEntry> {
        self.installed_mods
            .iter()
            .find(|entry| same_remote(&entry.remote, remote.as_ref()))
    }

    /// Check if remote is already tracked.
    pub fn is_installed(&self, remote: impl AsRef<str>) -> bool {
        self.find_by_remote(remote).is_some()
    }

    /// Track a new entry.
    ///
    /// Returns false without modifying the document if an entry with the same
    /// remote is already tracked.
    pub fn register(&mut self, entry: InstalledEntry) -> bool {
        if self.is_installed(&entry.remote) {
            return false;
        }

        self.installed_mods.push(entry);
        true
    }

    /// Stop tracking entry with matching remote.
    pub fn deregister(&mut self, remote: impl AsRef<str>) -> Option<InstalledEntry> {
        let index = self
            .installed_mods
            .iter()
            .position(|entry| same_remote(&entry.remote, remote.as_ref()))?;

        Some(self.installed_mods.remove(index))
    }
}

impl FromStr for StateDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut document: StateDocument =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on installation directory field.
        if let Some(dir) = document.installation_dir.take() {
            document.installation_dir = Some(PathBuf::from(
                shellexpand::full(dir.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(document)
    }
}

impl Display for StateDocument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Installed mod entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct InstalledEntry {
    /// Name of the directory the mod lives in.
    pub name: String,

    /// Name of the matching catalog entry at the time of registration.
    #[serde(rename = "mod")]
    pub mod_name: String,

    /// Absolute path to the mod's checkout.
    pub dir: PathBuf,

    /// Remote URL the checkout fetches from.
    pub remote: String,

    /// Cached listing of supported game versions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn entry(name: &str, remote: &str) -> InstalledEntry {
        InstalledEntry {
            name: name.into(),
            mod_name: name.into(),
            dir: PathBuf::from("/mods").join(name),
            remote: remote.into(),
            versions: Vec::new(),
        }
    }

    #[sealed_test(env = [("MODS", "/home/blah/mods")])]
    fn deserialize_state_document() -> anyhow::Result<()> {
        let result: StateDocument = r#"
            installation-dir = "$MODS"

            [[installed-mods]]
            name = "rjw"
            mod = "rjw"
            dir = "/home/blah/mods/rjw"
            remote = "https://x/rjw.git"
            versions = ["1.4", "1.5"]

            [[installed-mods]]
            name = "ex"
            mod = "rjw-ex"
            dir = "/home/blah/mods/ex"
            remote = "https://x/rjw-ex.git"
        "#
        .parse()?;

        let expect = StateDocument {
            installation_dir: Some(PathBuf::from("/home/blah/mods")),
            installed_mods: vec![
                InstalledEntry {
                    name: "rjw".into(),
                    mod_name: "rjw".into(),
                    dir: PathBuf::from("/home/blah/mods/rjw"),
                    remote: "https://x/rjw.git".into(),
                    versions: vec!["1.4".into(), "1.5".into()],
                },
                InstalledEntry {
                    name: "ex".into(),
                    mod_name: "rjw-ex".into(),
                    dir: PathBuf::from("/home/blah/mods/ex"),
                    remote: "https://x/rjw-ex.git".into(),
                    versions: Vec::new(),
                },
            ],
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn empty_state_document() -> anyhow::Result<()> {
        let result: StateDocument = "".parse()?;
        assert_eq!(result, StateDocument::default());

        Ok(())
    }

    #[test]
    fn serialized_state_document_parses_back() -> anyhow::Result<()> {
        let mut document = StateDocument {
            installation_dir: Some(PathBuf::from("/mods")),
            installed_mods: vec![entry("rjw", "https://x/rjw.git")],
        };
        document.installed_mods[0].versions = vec!["1.5".into()];

        let result: StateDocument = document.to_string().parse()?;
        assert_eq!(result, document);

        Ok(())
    }

    #[test]
    fn register_rejects_duplicate_remote() {
        let mut document = StateDocument::default();

        assert!(document.register(entry("rjw", "https://x/rjw.git")));
        assert!(!document.register(entry("rjw-copy", "https://x/rjw")));
        assert_eq!(document.installed_mods.len(), 1);
        assert_eq!(document.installed_mods[0].name, "rjw");
    }

    #[test]
    fn deregister_by_normalized_remote() {
        let mut document = StateDocument::default();
        document.register(entry("rjw", "https://x/rjw.git"));
        document.register(entry("ex", "https://x/rjw-ex.git"));

        let removed = document.deregister("https://x/rjw");
        assert_eq!(removed.map(|e| e.name), Some("rjw".to_string()));
        assert_eq!(document.installed_mods, vec![entry("ex", "https://x/rjw-ex.git")]);
        assert!(document.deregister("https://x/rjw").is_none());
    }
}
