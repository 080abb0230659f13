// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use lazymod::{
    mutate::{UpdateOptions, UpdateStatus},
    path::{default_catalog_file, default_state_file},
    reconcile::Classification,
    Catalog, Git2Vcs, ModManager, StateDocument, StateStore,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::{
    env::current_dir,
    path::{absolute, Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "lazymod [options] [command]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// RimWorld mod directory, defaults to last used or current directory.
    #[arg(short, long, global = true, value_name = "path")]
    pub dir: Option<PathBuf>,

    /// Mod catalog to use.
    #[arg(long, global = true, value_name = "path")]
    pub catalog: Option<PathBuf>,

    /// State document to use.
    #[arg(long, global = true, value_name = "path")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let manager = open_manager(self.catalog, self.state)?;
        let root = resolve_root(&manager, self.dir)?;

        match self.command {
            None => run_overview(&manager, &root),
            Some(Command::List) => run_list(&manager, &root).await,
            Some(Command::Install(opts)) => run_install(&manager, &root, opts),
            Some(Command::Update(opts)) => run_update(&manager, opts).await,
            Some(Command::Uninstall(opts)) => run_uninstall(&manager, opts),
            Some(Command::Debug) => run_debug(&manager),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Scan mod directory and list installed mods.
    #[command(visible_alias = "check", override_usage = "lazymod list [options]")]
    List,

    /// Install mod that does not exist yet, will not update.
    #[command(override_usage = "lazymod install [options] <mod_name>")]
    Install(InstallOptions),

    /// Update installed mods, will not install new mods.
    #[command(override_usage = "lazymod update [options]")]
    Update(UpdateArgs),

    /// Remove installed mod.
    #[command(override_usage = "lazymod uninstall [options] <mod_name>")]
    Uninstall(UninstallOptions),

    /// Dump state document.
    #[command(override_usage = "lazymod debug [options]")]
    Debug,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InstallOptions {
    /// Name of catalog mod to install.
    #[arg(required = true, value_name = "mod_name")]
    pub mod_name: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UpdateArgs {
    /// Show recent history of every mod.
    #[arg(short, long, group = "history")]
    pub log: bool,

    /// Show recent history of mods that changed.
    #[arg(short, long, group = "history")]
    pub changed_log: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UninstallOptions {
    /// Name of catalog mod to remove.
    #[arg(required = true, value_name = "mod_name")]
    pub mod_name: String,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn open_manager(catalog: Option<PathBuf>, state: Option<PathBuf>) -> Result<ModManager> {
    let catalog_path = match catalog {
        Some(path) => path,
        None => default_catalog_file()?,
    };
    let state_path = match state {
        Some(path) => path,
        None => default_state_file()?,
    };

    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("cannot load mod catalog {:?}", catalog_path.display()))?;

    Ok(ModManager::new(catalog, StateStore::new(state_path), Git2Vcs::new()))
}

fn resolve_root(manager: &ModManager, dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(absolute(dir)?);
    }

    match manager.state()?.installation_dir {
        Some(dir) => Ok(dir),
        None => Ok(current_dir()?),
    }
}

fn run_overview(manager: &ModManager, root: &Path) -> Result<()> {
    let state = manager.state()?;
    println!("Lazy installer and updater for RimWorld mods\n");
    println!("You have installed:\n");
    print_installed(manager.catalog(), &state, root);
    print_installable(manager)?;

    Ok(())
}

async fn run_list(manager: &ModManager, root: &Path) -> Result<()> {
    let reconciliation = manager.check(root).await?;
    println!("You have installed:\n");
    print_installed(manager.catalog(), &reconciliation.state, root);

    for (classification, heading) in [
        (Classification::Missing, "No longer found"),
        (Classification::Duplicate, "Duplicate checkouts"),
        (Classification::Unknown, "Not in catalog"),
    ] {
        let entries = reconciliation.classified(classification).collect::<Vec<_>>();
        if entries.is_empty() {
            continue;
        }

        println!("\n{heading}:\n");
        for entry in entries {
            println!(
                "\t{:<30} {:<50} {}",
                entry.name,
                entry.remote,
                shorten(&entry.dir, root)
            );
        }
    }

    print_installable(manager)?;

    Ok(())
}

fn run_install(manager: &ModManager, root: &Path, opts: InstallOptions) -> Result<()> {
    let entry = manager.install(&opts.mod_name, root, ProgressBar::new(0))?;
    info!("installed {} into {:?}", entry.name, entry.dir.display());

    Ok(())
}

async fn run_update(manager: &ModManager, opts: UpdateArgs) -> Result<()> {
    let options = UpdateOptions {
        show_log: opts.log,
        show_only_changed_log: opts.changed_log,
    };

    let outcomes = manager.update(options).await?;
    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(UpdateStatus::Updated { from, to }) => {
                println!("- Updated {} ({} -> {})", outcome.name, short(from), short(to));
            }
            Ok(UpdateStatus::UpToDate) => println!("- {} is up to date", outcome.name),
            Err(err) => {
                failures += 1;
                println!("- Failed to update {}: {err}", outcome.name);
            }
        }

        for entry in &outcome.log {
            println!("\t{} {}", entry.hash, entry.message);
        }
    }

    if failures == 0 {
        info!("all mods updated");
    } else {
        warn!("{failures} of {} mods failed to update", outcomes.len());
    }

    Ok(())
}

fn run_uninstall(manager: &ModManager, opts: UninstallOptions) -> Result<()> {
    let entry = manager.uninstall(&opts.mod_name)?;
    info!("uninstalled {} from {:?}", entry.name, entry.dir.display());

    Ok(())
}

fn run_debug(manager: &ModManager) -> Result<()> {
    print!("{}", manager.state()?);

    Ok(())
}

fn print_installed(catalog: &Catalog, state: &StateDocument, root: &Path) {
    if state.installed_mods.is_empty() {
        println!("\tNo mods!");
        return;
    }

    for entry in &state.installed_mods {
        let label = catalog
            .find_by_remote(&entry.remote)
            .map(|known| known.label.as_str())
            .unwrap_or(entry.mod_name.as_str());
        println!(
            "\t{:<50} {:<30} {:<40} {}",
            label,
            entry.name,
            shorten(&entry.dir, root),
            entry.versions.join(", ")
        );
    }
}

fn print_installable(manager: &ModManager) -> Result<()> {
    println!("\nInstallable mods:\n");
    for entry in manager.installable()? {
        let mut note = entry.remark.clone().unwrap_or_default();
        if entry.deprecated {
            note = format!("deprecated {note}");
        }
        println!(
            "\t{:<50} {:<30} {:<60} {}",
            entry.label, entry.name, entry.remote, note
        );
    }
    println!("\n\ti.e. $ lazymod install <mod_name>\n");

    Ok(())
}

fn shorten(dir: &Path, root: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(relative) => Path::new("[mods]").join(relative).display().to_string(),
        Err(_) => dir.display().to_string(),
    }
}

fn short(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}
