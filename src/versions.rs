// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Supported game version lookup.
//!
//! RimWorld mods describe themselves in `About/About.xml`. The only part
//! lazymod cares about is the list of game versions the mod supports:
//!
//! ```xml
//! <ModMetaData>
//!   <supportedVersions>
//!     <li>1.4</li>
//!     <li>1.5</li>
//!   </supportedVersions>
//! </ModMetaData>
//! ```

use serde::Deserialize;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// Location of mod metadata relative to checkout root.
pub const METADATA_PATH: &str = "About/About.xml";

#[derive(Debug, Default, Deserialize)]
struct ModMetaData {
    #[serde(rename = "supportedVersions", default)]
    supported_versions: Option<SupportedVersions>,
}

#[derive(Debug, Default, Deserialize)]
struct SupportedVersions {
    #[serde(default)]
    li: Vec<String>,
}

/// Read supported game versions of mod checkout.
///
/// A metadata file without a version listing yields an empty list.
///
/// # Errors
///
/// - Return [`VersionsError::Read`] if the metadata file cannot be read.
/// - Return [`VersionsError::Deserialize`] if the metadata file is malformed.
pub fn supported_versions(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = dir.as_ref().join(METADATA_PATH);
    let content = read_to_string(&path).map_err(|err| VersionsError::Read {
        source: err,
        path: path.clone(),
    })?;

    parse_supported_versions(&content)
}

fn parse_supported_versions(content: &str) -> Result<Vec<String>> {
    let metadata: ModMetaData = quick_xml::de::from_str(content)?;
    let versions = metadata
        .supported_versions
        .map(|listing| listing.li)
        .unwrap_or_default()
        .into_iter()
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .collect();

    Ok(versions)
}

/// Version lookup error types.
#[derive(Debug, thiserror::Error)]
pub enum VersionsError {
    /// Metadata file cannot be read.
    #[error("failed to read mod metadata at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Metadata file is not valid XML of the expected shape.
    #[error(transparent)]
    Deserialize(#[from] quick_xml::DeError),
}

/// Friendly result alias :3
type Result<T, E = VersionsError> = std::result::Result<T, E>;
