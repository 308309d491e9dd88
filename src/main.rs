// src/main.rs

mod cli;

use anyhow::Result;
use auric::alpm;
use auric::registry::AurClient;
use auric::version::vercmp;
use auric::{Config, Pool, RebuildMode, TargetMode, get_order};
use clap::Parser;
use cli::{Cli, Commands, ResolveArgs};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

/// Apply command-line overrides on top of the configuration file
fn apply_overrides(config: &mut Config, args: &ResolveArgs) {
    if args.aur {
        config.mode = TargetMode::Aur;
    } else if args.repo {
        config.mode = TargetMode::Repo;
    }
    if args.noconfirm {
        config.no_confirm = true;
    }
    if args.useask {
        config.use_ask = true;
    }
    if args.rebuild_tree {
        config.rebuild = RebuildMode::Tree;
    }
    if args.no_provides {
        config.provides = false;
    }
}

fn cmd_resolve(config_path: Option<&Path>, args: ResolveArgs) -> Result<()> {
    let mut config = Config::load(config_path)?;
    apply_overrides(&mut config, &args);

    let mut opts = config.resolve_options();
    opts.ignore_providers = args.ignore_providers;

    info!("Loading pacman databases from {}", config.db_path.display());
    let db = alpm::load(&config.db_path, &config.pacman_conf)?;
    let registry = AurClient::new(&config.aur_url)?;

    let mut pool = Pool::new(&db, &registry).with_ignored_warnings(config.ignore.clone());
    pool.resolve_targets(&args.targets, &opts)?;

    if !args.nodeps {
        pool.check_missing()?;
    }
    pool.check_conflicts(config.use_ask, config.no_confirm)?;

    let groups = pool.groups().to_vec();
    let order = get_order(&mut pool);

    if order.is_empty() && groups.is_empty() {
        println!(" there is nothing to do");
        return Ok(());
    }

    if !groups.is_empty() {
        println!("[Groups:{}]  {}", groups.len(), groups.join("  "));
    }
    print!("{}", order);

    if order.has_make() {
        println!("Only needed to build: {}", order.make_only().join(" "));
    }

    Ok(())
}

fn vercmp_sign(a: &str, b: &str) -> i32 {
    match vercmp(a, b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve(args) => cmd_resolve(cli.config.as_deref(), args),
        Commands::Vercmp { a, b } => {
            println!("{}", vercmp_sign(&a, &b));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_args(argv: &[&str]) -> ResolveArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Resolve(args) => args,
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_vercmp_sign() {
        assert_eq!(vercmp_sign("1.0", "1.1"), -1);
        assert_eq!(vercmp_sign("1:1.0", "2.0"), 1);
        assert_eq!(vercmp_sign("1.0-1", "1.0"), 0);
    }

    #[test]
    fn test_overrides() {
        let args = resolve_args(&["auric", "resolve", "--repo", "--noconfirm", "--rebuild-tree", "--no-provides", "yay"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.mode, TargetMode::Repo);
        assert!(config.no_confirm);
        assert_eq!(config.rebuild, RebuildMode::Tree);
        assert!(!config.provides);
        assert_eq!(args.targets, vec!["yay".to_string()]);
    }

    #[test]
    fn test_aur_and_repo_conflict() {
        assert!(Cli::try_parse_from(["auric", "resolve", "--aur", "--repo", "yay"]).is_err());
    }

    #[test]
    fn test_resolve_requires_targets() {
        assert!(Cli::try_parse_from(["auric", "resolve"]).is_err());
    }
}
