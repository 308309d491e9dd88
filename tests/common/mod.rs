// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use auric::alpm::{PackageDb, RepoPackage};
use auric::registry::{Registry, RemotePackage};
use auric::{Pool, ResolveOptions, Result};
use std::sync::Mutex;

/// In-memory registry that records every call it receives.
pub struct MockRegistry {
    packages: Vec<RemotePackage>,
    info_calls: Mutex<Vec<Vec<String>>>,
    search_calls: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new(packages: Vec<RemotePackage>) -> Self {
        Self {
            packages,
            info_calls: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Every name passed to `info`, across all calls, sorted.
    pub fn queried_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.info_calls.lock().unwrap().iter().flatten().cloned().collect();
        names.sort();
        names
    }

    pub fn info_call_count(&self) -> usize {
        self.info_calls.lock().unwrap().len()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }
}

impl Registry for MockRegistry {
    fn info(&self, names: &[String]) -> Result<Vec<RemotePackage>> {
        self.info_calls.lock().unwrap().push(names.to_vec());
        Ok(self
            .packages
            .iter()
            .filter(|pkg| names.contains(&pkg.name))
            .cloned()
            .collect())
    }

    fn search(&self, query: &str) -> Result<Vec<RemotePackage>> {
        self.search_calls.lock().unwrap().push(query.to_string());
        Ok(self
            .packages
            .iter()
            .filter(|pkg| pkg.name.contains(query))
            .cloned()
            .collect())
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Options that never prompt.
pub fn opts() -> ResolveOptions {
    ResolveOptions {
        no_confirm: true,
        ..Default::default()
    }
}

/// A pool that can never block on stdin.
pub fn pool<'a>(db: &'a PackageDb, registry: &'a MockRegistry) -> Pool<'a> {
    Pool::new(db, registry).with_input(std::io::empty())
}

/// Resolve `targets` with [`opts`] into a fresh pool.
pub fn resolve<'a>(targets: &[&str], db: &'a PackageDb, registry: &'a MockRegistry) -> Pool<'a> {
    let mut pool = pool(db, registry);
    pool.resolve_targets(&names(targets), &opts()).unwrap();
    pool
}

/// A small system: core and extra repositories plus a few installed packages.
pub fn system_db() -> PackageDb {
    PackageDb::new()
        .with_sync_db(
            "core",
            vec![
                RepoPackage::new("glibc", "2.39-1"),
                RepoPackage::new("bar", "1.0-1").with_depends(&["glibc"]),
                RepoPackage::new("bash", "5.2-1").with_depends(&["glibc"]),
            ],
        )
        .with_sync_db(
            "extra",
            vec![
                RepoPackage::new("go", "1.22-1").with_depends(&["glibc"]),
                RepoPackage::new("git", "2.45-1").with_depends(&["glibc"]),
            ],
        )
        .with_local(RepoPackage::new("glibc", "2.39-1"))
        .with_local(RepoPackage::new("bash", "5.2-1"))
}
