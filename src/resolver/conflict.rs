// src/resolver/conflict.rs

//! Conflict detection over a resolved pool
//!
//! Three directions are checked:
//! - forward: a package being installed conflicts with something installed
//! - reverse: something installed conflicts with a package being installed
//! - inner: two packages being installed conflict with each other

use super::pool::Pool;
use crate::alpm::RepoPackage;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{info, warn};

/// Package name -> packages it conflicts with
pub type ConflictMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    /// Forward and reverse conflicts, plus every package named in `inner`
    pub conflicts: ConflictMap,
    pub inner: ConflictMap,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Packages whose installation needs confirmation
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.conflicts.keys().map(String::as_str)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.inner.is_empty() {
            writeln!(f, "Inner conflicts found:")?;
            for (name, pkgs) in &self.inner {
                writeln!(f, "  {}: {}", name, join(pkgs))?;
            }
        }

        let removals: Vec<_> = self.conflicts.iter().filter(|(_, p)| !p.is_empty()).collect();
        if !removals.is_empty() {
            writeln!(f, "Package conflicts found:")?;
            for (name, pkgs) in removals {
                writeln!(f, "  Installing {} will remove: {}", name, join(pkgs))?;
            }
        }

        Ok(())
    }
}

fn join(pkgs: &BTreeSet<String>) -> String {
    pkgs.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn add(map: &mut ConflictMap, name: &str, other: String) {
    map.entry(name.to_string()).or_default().insert(other);
}

/// `pkg (conflict)` unless the conflict names the package itself
fn label(name: &str, conflict: &str) -> String {
    if name == conflict {
        name.to_string()
    } else {
        format!("{} ({})", name, conflict)
    }
}

impl Pool<'_> {
    /// Find conflicts and decide whether they can go ahead
    ///
    /// Conflicts are fine when `use_ask` hands them to pacman's own prompt or
    /// when the user confirms them; with `no_confirm` and no `use_ask` they
    /// are fatal.
    pub fn check_conflicts(&self, use_ask: bool, no_confirm: bool) -> Result<ConflictReport> {
        let report = self.find_conflicts();

        if !report.is_empty() {
            print!("{}", report);

            if !use_ask {
                if no_confirm {
                    return Err(Error::UnresolvableConflicts);
                }
                warn!("Conflicting packages will have to be confirmed manually");
            }
        }

        Ok(report)
    }

    /// Run the outer and inner sweeps concurrently
    pub fn find_conflicts(&self) -> ConflictReport {
        info!("Checking for conflicts...");

        let (mut conflicts, inner) = rayon::join(
            || {
                let local = self.db.local_packages();
                let mut conflicts = ConflictMap::new();
                self.check_forward_conflicts(&local, &mut conflicts);
                self.check_reverse_conflicts(&local, &mut conflicts);
                conflicts
            },
            || {
                let mut inner = ConflictMap::new();
                self.check_inner_conflicts(&mut inner);
                inner
            },
        );

        // Install order is not known yet, so every package in an inner
        // conflict needs confirmation
        for (name, pkgs) in &inner {
            conflicts.entry(name.clone()).or_default();
            for pkg in pkgs {
                conflicts.entry(pkg.clone()).or_default();
            }
        }

        ConflictReport { conflicts, inner }
    }

    /// Name and declared conflicts of every package about to be installed
    fn install_set_conflicts(&self) -> Vec<(&str, Vec<String>)> {
        self.remote
            .values()
            .map(|pkg| (pkg.name.as_str(), pkg.conflicts.clone()))
            .chain(
                self.repo
                    .values()
                    .map(|pkg| (pkg.name.as_str(), self.db.package_conflicts(pkg))),
            )
            .collect()
    }

    /// Packages in the install set other than `name` that satisfy `conflict`
    fn install_set_satisfiers(&self, name: &str, conflict: &str) -> Vec<String> {
        let remote = self
            .remote
            .values()
            .filter(|pkg| pkg.name != name && pkg.satisfies(conflict))
            .map(|pkg| pkg.name.clone());
        let repo = self
            .repo
            .values()
            .filter(|pkg| pkg.name != name && self.repo_satisfies(pkg, conflict))
            .map(|pkg| pkg.name.clone());
        remote.chain(repo).collect()
    }

    fn check_forward_conflicts(&self, local: &[RepoPackage], conflicts: &mut ConflictMap) {
        for (name, declared) in self.install_set_conflicts() {
            for conflict in &declared {
                for installed in local {
                    if installed.name == name || self.has_package(&installed.name) {
                        continue;
                    }
                    if self.repo_satisfies(installed, conflict) {
                        add(conflicts, name, label(&installed.name, conflict));
                    }
                }
            }
        }
    }

    fn check_reverse_conflicts(&self, local: &[RepoPackage], conflicts: &mut ConflictMap) {
        for installed in local {
            if self.has_package(&installed.name) {
                continue;
            }
            for conflict in self.db.package_conflicts(installed) {
                for pkg in self.install_set_satisfiers(&installed.name, &conflict) {
                    add(conflicts, &pkg, label(&installed.name, &conflict));
                }
            }
        }
    }

    fn check_inner_conflicts(&self, inner: &mut ConflictMap) {
        for (name, declared) in self.install_set_conflicts() {
            for conflict in &declared {
                for other in self.install_set_satisfiers(name, conflict) {
                    add(inner, name, other);
                }
            }
        }
    }
}
