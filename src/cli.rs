// src/cli.rs
//! CLI definitions for auric
//!
//! The command implementations live in `main.rs`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "auric")]
#[command(author, version)]
#[command(about = "Resolve package dependencies across pacman repositories and the AUR", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve targets into a build and install plan
    Resolve(ResolveArgs),

    /// Compare two package versions (prints -1, 0 or 1)
    Vercmp {
        /// First version
        a: String,

        /// Second version
        b: String,
    },
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Packages to resolve, optionally prefixed with a database (`core/`, `aur/`)
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Only use the AUR
    #[arg(long, conflicts_with = "repo")]
    pub aur: bool,

    /// Only use the sync repositories
    #[arg(long)]
    pub repo: bool,

    /// Never prompt
    #[arg(long)]
    pub noconfirm: bool,

    /// Skip the missing dependency check
    #[arg(long)]
    pub nodeps: bool,

    /// Leave conflicts to pacman's --ask prompt
    #[arg(long)]
    pub useask: bool,

    /// Rebuild installed AUR dependencies that have no repository replacement
    #[arg(long)]
    pub rebuild_tree: bool,

    /// Prefer a provider matching a target over asking
    #[arg(long)]
    pub ignore_providers: bool,

    /// Do not search the AUR for alternative providers
    #[arg(long)]
    pub no_provides: bool,
}
