// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations for the files lazymod reads and writes between
//! runs: the state document and the mod catalog.

use std::path::PathBuf;

/// Determine default absolute path to lazymod's configuration directory.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/lazymod`. Does not check if
/// the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("lazymod"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the state document.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
pub fn default_state_file() -> Result<PathBuf> {
    default_config_dir().map(|path| path.join("state.toml"))
}

/// Determine default absolute path to the mod catalog.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
pub fn default_catalog_file() -> Result<PathBuf> {
    default_config_dir().map(|path| path.join("mods.json"))
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
