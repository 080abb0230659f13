// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mod catalog.
//!
//! The __catalog__ is the curated list of mods that lazymod knows how to
//! install. Each entry is keyed by the remote repository it is cloned from.
//! The catalog is loaded once per run and never modified by lazymod itself.
//!
//! # Catalog Layout
//!
//! The catalog is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "name": "rjw",
//!     "remote": "https://gitgud.io/Ed86/rjw.git",
//!     "label": "RimJobWorld",
//!     "deprecated": false,
//!     "remark": "Core"
//!   }
//! ]
//! ```
//!
//! # Remote Identity
//!
//! Remotes are compared after [normalization](normalize_remote), so
//! `https://host/mod.git` and `https://host/mod` name the same mod.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Known installable mod.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct CatalogEntry {
    /// Short unique slug used to refer to the mod on the command line.
    pub name: String,

    /// Remote URL to clone the mod from.
    pub remote: String,

    /// Human readable name.
    pub label: String,

    /// Mod is no longer maintained upstream.
    #[serde(default)]
    pub deprecated: bool,

    /// Optional free text, e.g., the category the mod belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Ordered collection of known mods.
///
/// # Invariant
///
/// - Entry names are unique.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Construct new catalog from a listing of entries.
    ///
    /// # Errors
    ///
    /// - Return [`CatalogError::DuplicateName`] if two entries share a name.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let entries = entries.into_iter().collect::<Vec<_>>();
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Load catalog from a JSON document on disk.
    ///
    /// # Errors
    ///
    /// - Return [`CatalogError::Read`] if the document cannot be read.
    /// - Return [`CatalogError::Deserialize`] if the document is malformed.
    /// - Return [`CatalogError::DuplicateName`] if two entries share a name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|err| CatalogError::Read {
            source: err,
            path: path.as_ref().to_path_buf(),
        })?;

        content.parse()
    }

    /// Find catalog entry by exact name.
    pub fn find_by_name(&self, name: impl AsRef<str>) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == name.as_ref())
    }

    /// Find catalog entry by remote, comparing normalized remotes.
    pub fn find_by_remote(&self, remote: impl AsRef<str>) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| same_remote(&entry.remote, remote.as_ref()))
    }

    /// Check if remote belongs to a known mod.
    pub fn is_mod_remote(&self, remote: impl AsRef<str>) -> bool {
        self.find_by_remote(remote).is_some()
    }

    /// Iterate through entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Catalog {
    type Err = CatalogError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(data)?;
        Self::new(entries)
    }
}

/// Normalize remote URL for identity comparison.
///
/// Trims surrounding whitespace, trailing slashes, and a trailing `.git`
/// suffix.
pub fn normalize_remote(remote: &str) -> &str {
    let remote = remote.trim().trim_end_matches('/');
    remote.strip_suffix(".git").unwrap_or(remote)
}

/// Check if two remotes name the same repository after normalization.
pub fn same_remote(lhs: &str, rhs: &str) -> bool {
    normalize_remote(lhs) == normalize_remote(rhs)
}

/// Catalog error types.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog document cannot be read.
    #[error("failed to read catalog at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Catalog document is not valid JSON of the expected shape.
    #[error(transparent)]
    Deserialize(#[from] serde_json::Error),

    /// Two entries share the same name.
    #[error("catalog lists mod {name:?} more than once")]
    DuplicateName { name: String },
}

/// Friendly result alias :3
type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("https://x/rjw.git", "https://x/rjw"; "git suffix")]
    #[test_case("https://x/rjw/", "https://x/rjw"; "trailing slash")]
    #[test_case("https://x/rjw.git/", "https://x/rjw"; "suffix and slash")]
    #[test_case("  https://x/rjw\n", "https://x/rjw"; "whitespace")]
    #[test_case("https://x/rjw.github", "https://x/rjw.github"; "suffix lookalike")]
    #[test]
    fn normalize_remote_strips_suffix(remote: &str, expect: &str) {
        pretty_assertions::assert_eq!(normalize_remote(remote), expect);
    }

    #[test]
    fn same_remote_ignores_git_suffix() {
        assert!(same_remote("https://x/rjw.git", "https://x/rjw"));
        assert!(!same_remote("https://x/rjw.git", "https://x/rjw-ex.git"));
    }

    #[test]
    fn deserialize_catalog() -> anyhow::Result<()> {
        let result: Catalog = indoc! {r#"
            [
              { "name": "rjw", "remote": "https://x/rjw.git", "label": "RJW" },
              {
                "name": "rjw-ex",
                "remote": "https://x/rjw-ex",
                "label": "RJW Extension",
                "deprecated": true,
                "remark": "Submods"
              }
            ]
        "#}
        .parse()?;

        let expect = Catalog::new([
            CatalogEntry {
                name: "rjw".into(),
                remote: "https://x/rjw.git".into(),
                label: "RJW".into(),
                deprecated: false,
                remark: None,
            },
            CatalogEntry {
                name: "rjw-ex".into(),
                remote: "https://x/rjw-ex".into(),
                label: "RJW Extension".into(),
                deprecated: true,
                remark: Some("Submods".into()),
            },
        ])?;

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn catalog_rejects_duplicate_names() {
        let result = r#"[
            { "name": "rjw", "remote": "https://x/rjw.git", "label": "RJW" },
            { "name": "rjw", "remote": "https://y/rjw.git", "label": "RJW" }
        ]"#
        .parse::<Catalog>();

        assert!(matches!(result, Err(CatalogError::DuplicateName { name }) if name == "rjw"));
    }

    #[test]
    fn catalog_lookup() -> anyhow::Result<()> {
        let catalog: Catalog =
            r#"[{ "name": "rjw", "remote": "https://x/rjw.git", "label": "RJW" }]"#.parse()?;

        assert_eq!(catalog.find_by_name("rjw").map(|e| e.label.as_str()), Some("RJW"));
        assert!(catalog.find_by_name("RJW").is_none());
        assert_eq!(
            catalog.find_by_remote("https://x/rjw").map(|e| e.name.as_str()),
            Some("rjw")
        );
        assert!(catalog.is_mod_remote("https://x/rjw.git/"));
        assert!(!catalog.is_mod_remote("https://x/other.git"));

        Ok(())
    }
}
