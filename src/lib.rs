// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Lazy installer and updater for Git hosted RimWorld mods.
//!
//! Lazymod tracks a curated [catalog](catalog) of mods that live in Git
//! repositories, and keeps a local installation directory of mod checkouts in
//! sync with it. It remembers what it installed in a small
//! [state document](config::StateDocument).
//!
//! # Reconciliation
//!
//! The state document is never trusted blindly. The [`reconcile`] pass scans
//! the installation directory, probes every entry for a Git checkout, and
//! matches the checkout's remote against the catalog. What it finds replaces
//! the state document wholesale.
//!
//! # Mutation
//!
//! [Install](mutate::install), [update](mutate::update), and
//! [uninstall](mutate::uninstall) then operate against that state document.
//! The [`ModManager`] binds everything together for the command line.

pub mod catalog;
pub mod config;
pub mod manager;
pub mod mutate;
pub mod path;
pub mod probe;
pub mod reconcile;
pub mod store;
pub mod vcs;
pub mod versions;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{InstalledEntry, StateDocument};
pub use manager::{ManagerError, ModManager};
pub use store::StateStore;
pub use vcs::{Git2Vcs, VersionControl};
