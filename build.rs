// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Boolean switch argument
fn flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).action(ArgAction::SetTrue).help(help)
}

fn build_cli() -> Command {
    Command::new("auric")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve package dependencies across pacman repositories and the AUR")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Path to the configuration file"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve targets into a build and install plan")
                .arg(
                    Arg::new("targets")
                        .required(true)
                        .num_args(1..)
                        .help("Packages to resolve, optionally prefixed with a database"),
                )
                .arg(flag("aur", "Only use the AUR"))
                .arg(flag("repo", "Only use the sync repositories"))
                .arg(flag("noconfirm", "Never prompt"))
                .arg(flag("nodeps", "Skip the missing dependency check"))
                .arg(flag("useask", "Leave conflicts to pacman's --ask prompt"))
                .arg(flag(
                    "rebuild-tree",
                    "Rebuild installed AUR dependencies that have no repository replacement",
                ))
                .arg(flag("ignore-providers", "Prefer a provider matching a target over asking"))
                .arg(flag("no-provides", "Do not search the AUR for alternative providers")),
        )
        .subcommand(
            Command::new("vercmp")
                .about("Compare two package versions (prints -1, 0 or 1)")
                .arg(Arg::new("a").required(true).help("First version"))
                .arg(Arg::new("b").required(true).help("Second version")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("auric.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
