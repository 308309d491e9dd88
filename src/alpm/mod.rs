// src/alpm/mod.rs

//! Binary packages from the native pacman databases
//!
//! The resolver only talks to the local database through [`LocalDb`]. The
//! provided implementation, [`PackageDb`], keeps every sync repository and the
//! local (installed) database in memory; [`load`] fills one from pacman's
//! on-disk layout, and tests build one directly.

mod desc;
mod load;

pub use desc::parse_desc;
pub use load::{load, load_local_db, load_sync_db, parse_pacman_conf};

use crate::version::{satisfies_name, satisfies_provide};
use std::collections::BTreeMap;

/// A package from a sync repository or the local database
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoPackage {
    pub name: String,
    pub version: String,
    /// Repository the package came from, `local` for installed packages
    pub db: String,
    pub description: Option<String>,
    pub depends: Vec<String>,
    pub optdepends: Vec<String>,
    pub provides: Vec<String>,
    pub conflicts: Vec<String>,
    pub groups: Vec<String>,
}

impl RepoPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = db.into();
        self
    }

    pub fn with_depends(mut self, deps: &[&str]) -> Self {
        self.depends = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_provides(mut self, provides: &[&str]) -> Self {
        self.provides = provides.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_conflicts(mut self, conflicts: &[&str]) -> Self {
        self.conflicts = conflicts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Check whether this package satisfies `dep` by name or by one of its provides
    pub fn satisfies(&self, dep: &str) -> bool {
        satisfies_name(&self.name, &self.version, dep)
            || self
                .provides
                .iter()
                .any(|p| satisfies_provide(p, dep, &self.version))
    }
}

/// Read access to the local package databases
///
/// Implementations must be safe to share across the conflict checker's threads.
pub trait LocalDb: Send + Sync {
    /// Best satisfier across all sync repositories, in configured order
    fn sync_satisfier(&self, dep: &str) -> Option<RepoPackage>;

    /// Satisfier from one named sync repository
    fn satisfier_from_db(&self, dep: &str, db: &str) -> Option<RepoPackage>;

    /// Members of a sync package group
    fn packages_from_group(&self, group: &str) -> Vec<RepoPackage>;

    /// Installed package by exact name
    fn local_package(&self, name: &str) -> Option<RepoPackage>;

    /// Every installed package
    fn local_packages(&self) -> Vec<RepoPackage>;

    /// Whether any installed package satisfies `dep`
    fn local_satisfier_exists(&self, dep: &str) -> bool;

    /// Whether `name` is installed at exactly `version`
    fn is_correct_version_installed(&self, name: &str, version: &str) -> bool {
        self.local_package(name)
            .is_some_and(|pkg| pkg.version == version)
    }

    fn package_depends(&self, pkg: &RepoPackage) -> Vec<String> {
        pkg.depends.clone()
    }

    fn package_conflicts(&self, pkg: &RepoPackage) -> Vec<String> {
        pkg.conflicts.clone()
    }

    fn package_provides(&self, pkg: &RepoPackage) -> Vec<String> {
        pkg.provides.clone()
    }

    fn package_optional_depends(&self, pkg: &RepoPackage) -> Vec<String> {
        pkg.optdepends.clone()
    }
}

/// One sync repository
#[derive(Debug, Clone, Default)]
pub struct SyncDb {
    pub name: String,
    pub packages: Vec<RepoPackage>,
}

/// In-memory package databases
#[derive(Debug, Clone, Default)]
pub struct PackageDb {
    sync: Vec<SyncDb>,
    local: BTreeMap<String, RepoPackage>,
}

impl PackageDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sync repository; earlier repositories take precedence
    pub fn add_sync_db(&mut self, name: impl Into<String>, packages: Vec<RepoPackage>) {
        let name = name.into();
        let packages = packages
            .into_iter()
            .map(|pkg| pkg.with_db(name.clone()))
            .collect();
        self.sync.push(SyncDb { name, packages });
    }

    pub fn add_local(&mut self, pkg: RepoPackage) {
        self.local.insert(pkg.name.clone(), pkg.with_db("local"));
    }

    pub fn with_sync_db(mut self, name: &str, packages: Vec<RepoPackage>) -> Self {
        self.add_sync_db(name, packages);
        self
    }

    pub fn with_local(mut self, pkg: RepoPackage) -> Self {
        self.add_local(pkg);
        self
    }

    pub fn sync_dbs(&self) -> &[SyncDb] {
        &self.sync
    }

    pub fn local_count(&self) -> usize {
        self.local.len()
    }

    /// Literal name matches win over provides, as pacman resolves dependencies
    fn find_satisfier<'a>(
        dbs: impl Iterator<Item = &'a SyncDb> + Clone,
        dep: &str,
    ) -> Option<RepoPackage> {
        let by_name = dbs.clone().find_map(|db| {
            db.packages
                .iter()
                .find(|pkg| satisfies_name(&pkg.name, &pkg.version, dep))
        });

        by_name
            .or_else(|| {
                dbs.flat_map(|db| db.packages.iter())
                    .find(|pkg| pkg.provides.iter().any(|p| satisfies_provide(p, dep, &pkg.version)))
            })
            .cloned()
    }
}

impl LocalDb for PackageDb {
    fn sync_satisfier(&self, dep: &str) -> Option<RepoPackage> {
        Self::find_satisfier(self.sync.iter(), dep)
    }

    fn satisfier_from_db(&self, dep: &str, db: &str) -> Option<RepoPackage> {
        Self::find_satisfier(self.sync.iter().filter(|s| s.name == db), dep)
    }

    fn packages_from_group(&self, group: &str) -> Vec<RepoPackage> {
        let mut seen = std::collections::HashSet::new();
        self.sync
            .iter()
            .flat_map(|db| db.packages.iter())
            .filter(|pkg| pkg.groups.iter().any(|g| g == group))
            .filter(|pkg| seen.insert(pkg.name.clone()))
            .cloned()
            .collect()
    }

    fn local_package(&self, name: &str) -> Option<RepoPackage> {
        self.local.get(name).cloned()
    }

    fn local_packages(&self) -> Vec<RepoPackage> {
        self.local.values().cloned().collect()
    }

    fn local_satisfier_exists(&self, dep: &str) -> bool {
        self.local.values().any(|pkg| pkg.satisfies(dep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> PackageDb {
        PackageDb::new()
            .with_sync_db(
                "core",
                vec![
                    RepoPackage::new("glibc", "2.39-1"),
                    RepoPackage::new("openssl", "3.3.0-1").with_provides(&["libssl.so=3-64"]),
                ],
            )
            .with_sync_db(
                "extra",
                vec![
                    RepoPackage::new("glibc", "9.9-1"),
                    RepoPackage::new("jdk-openjdk", "22-1")
                        .with_provides(&["java-environment=22"])
                        .with_groups(&["java"]),
                    RepoPackage::new("jre-openjdk", "22-1").with_groups(&["java"]),
                ],
            )
            .with_local(RepoPackage::new("bash", "5.2-1").with_provides(&["sh"]))
    }

    #[test]
    fn test_sync_satisfier_prefers_first_repo() {
        let db = sample_db();
        let pkg = db.sync_satisfier("glibc").unwrap();
        assert_eq!(pkg.db, "core");
        assert_eq!(pkg.version, "2.39-1");
    }

    #[test]
    fn test_sync_satisfier_respects_version() {
        let db = sample_db();
        let pkg = db.sync_satisfier("glibc>=3.0").unwrap();
        assert_eq!(pkg.db, "extra");
    }

    #[test]
    fn test_sync_satisfier_by_provide() {
        let db = sample_db();
        assert_eq!(db.sync_satisfier("java-environment>=17").unwrap().name, "jdk-openjdk");
        assert_eq!(db.sync_satisfier("libssl.so=3-64").unwrap().name, "openssl");
        assert!(db.sync_satisfier("nothing").is_none());
    }

    #[test]
    fn test_satisfier_from_db() {
        let db = sample_db();
        assert_eq!(db.satisfier_from_db("glibc", "extra").unwrap().version, "9.9-1");
        assert!(db.satisfier_from_db("openssl", "extra").is_none());
    }

    #[test]
    fn test_packages_from_group() {
        let db = sample_db();
        let names: Vec<_> = db.packages_from_group("java").into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["jdk-openjdk", "jre-openjdk"]);
    }

    #[test]
    fn test_local_lookups() {
        let db = sample_db();
        assert!(db.local_satisfier_exists("sh"));
        assert!(db.local_satisfier_exists("bash>=5"));
        assert!(!db.local_satisfier_exists("bash>=6"));
        assert!(db.is_correct_version_installed("bash", "5.2-1"));
        assert!(!db.is_correct_version_installed("bash", "5.1-1"));
        assert_eq!(db.local_package("bash").unwrap().db, "local");
    }
}
