// src/registry/mod.rs

//! Source packages from the AUR
//!
//! The resolver only needs two operations from the registry: a batched
//! metadata lookup by name and a free-text search. Both go through the
//! [`Registry`] trait so tests can substitute an in-memory registry.

mod client;

pub use client::AurClient;

use crate::error::{Error, Result};
use crate::version::{satisfies_name, satisfies_provide};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A package record as returned by the AUR RPC interface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RemotePackage {
    pub name: String,
    pub version: String,
    /// Packages sharing a base are built from one checkout
    pub package_base: String,
    pub description: Option<String>,
    pub depends: Vec<String>,
    pub make_depends: Vec<String>,
    pub check_depends: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
    pub maintainer: Option<String>,
    /// Unix timestamp of the out-of-date flag
    pub out_of_date: Option<i64>,
    pub arch: Vec<String>,
}

impl RemotePackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            package_base: name.clone(),
            name,
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.package_base = base.into();
        self
    }

    pub fn with_depends(mut self, deps: &[&str]) -> Self {
        self.depends = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_make_depends(mut self, deps: &[&str]) -> Self {
        self.make_depends = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_check_depends(mut self, deps: &[&str]) -> Self {
        self.check_depends = deps.iter().map(|s| s.to_string()).collect();
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

    /// Runtime, build and check dependencies, in that order
    pub fn dependency_lists(&self) -> [&[String]; 3] {
        [&self.depends, &self.make_depends, &self.check_depends]
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

/// Access to a source package registry
///
/// Both calls may be issued from several threads at once.
pub trait Registry: Send + Sync {
    /// Fetch full records for the named packages; unknown names are omitted
    fn info(&self, names: &[String]) -> Result<Vec<RemotePackage>>;

    /// Search packages by name and description
    fn search(&self, query: &str) -> Result<Vec<RemotePackage>>;
}

/// Problems noticed while fetching package records
#[derive(Debug, Clone, Default)]
pub struct RegistryWarnings {
    pub missing: Vec<String>,
    pub orphans: Vec<String>,
    pub out_of_date: Vec<String>,
    /// Names never reported
    pub ignore: HashSet<String>,
}

impl RegistryWarnings {
    pub fn new(ignore: impl IntoIterator<Item = String>) -> Self {
        Self {
            ignore: ignore.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.orphans.is_empty() && self.out_of_date.is_empty()
    }

    /// Record warnings for the queried `names` given the records that came back
    pub fn record(&mut self, names: &[String], info: &[RemotePackage]) {
        let by_name: HashMap<&str, &RemotePackage> =
            info.iter().map(|pkg| (pkg.name.as_str(), pkg)).collect();

        for name in names {
            if self.ignore.contains(name) {
                continue;
            }

            let Some(pkg) = by_name.get(name.as_str()) else {
                push_unique(&mut self.missing, name);
                continue;
            };

            if pkg.maintainer.as_deref().unwrap_or("").is_empty() {
                push_unique(&mut self.orphans, name);
            }
            if pkg.out_of_date.unwrap_or(0) != 0 {
                push_unique(&mut self.out_of_date, name);
            }
        }
    }

    /// Emit the collected warnings
    pub fn log(&self) {
        if !self.missing.is_empty() {
            warn!("Missing AUR Packages: {}", self.missing.join("  "));
        }
        if !self.orphans.is_empty() {
            warn!("Orphaned AUR Packages: {}", self.orphans.join("  "));
        }
        if !self.out_of_date.is_empty() {
            warn!("Flagged Out Of Date AUR Packages: {}", self.out_of_date.join("  "));
        }
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Fetch records for `names`, at most `split_n` names per request
///
/// Chunks are requested in parallel. A failing chunk does not stop the
/// others; every failure is collected into one [`Error::RegistryFetch`].
pub fn fetch_info(
    registry: &dyn Registry,
    names: &[String],
    split_n: usize,
    warnings: &mut RegistryWarnings,
) -> Result<Vec<RemotePackage>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let split_n = split_n.max(1);
    debug!(
        "Querying registry for {} packages in chunks of {}",
        names.len(),
        split_n
    );

    let results: Vec<Result<Vec<RemotePackage>>> = names
        .par_chunks(split_n)
        .map(|chunk| registry.info(chunk))
        .collect();

    let mut info = Vec::with_capacity(names.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(packages) => info.extend(packages),
            Err(e) => failures.push(e.to_string()),
        }
    }

    if !failures.is_empty() {
        return Err(Error::RegistryFetch(failures));
    }

    warnings.record(names, &info);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ChunkRegistry {
        packages: Vec<RemotePackage>,
        fail_on: Option<String>,
        calls: Mutex<Vec<usize>>,
    }

    impl Registry for ChunkRegistry {
        fn info(&self, names: &[String]) -> Result<Vec<RemotePackage>> {
            self.calls.lock().unwrap().push(names.len());
            if let Some(ref bad) = self.fail_on {
                if names.contains(bad) {
                    return Err(Error::RegistryError(format!("chunk with {} failed", bad)));
                }
            }
            Ok(self
                .packages
                .iter()
                .filter(|p| names.contains(&p.name))
                .cloned()
                .collect())
        }

        fn search(&self, _query: &str) -> Result<Vec<RemotePackage>> {
            Ok(Vec::new())
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remote_package_satisfies() {
        let pkg = RemotePackage::new("foo-git", "1.2.r3-1").with_provides(&["foo"]);
        assert!(pkg.satisfies("foo-git"));
        assert!(pkg.satisfies("foo>=1.0"));
        assert!(!pkg.satisfies("foo>=2.0"));
        assert!(!pkg.satisfies("bar"));
    }

    #[test]
    fn test_deserialize_rpc_record() {
        let json = r#"{
            "Name": "yay",
            "Version": "12.3.5-1",
            "PackageBase": "yay",
            "Depends": ["pacman>6.1", "git"],
            "MakeDepends": ["go>=1.21"],
            "Maintainer": null,
            "OutOfDate": 1700000000,
            "NumVotes": 2000
        }"#;
        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.name, "yay");
        assert_eq!(pkg.make_depends, vec!["go>=1.21"]);
        assert!(pkg.check_depends.is_empty());
        assert_eq!(pkg.maintainer, None);
        assert_eq!(pkg.out_of_date, Some(1700000000));
    }

    #[test]
    fn test_fetch_info_splits_requests() {
        let registry = ChunkRegistry {
            packages: vec![RemotePackage::new("a", "1"), RemotePackage::new("b", "1")],
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        };
        let mut warnings = RegistryWarnings::default();

        let info = fetch_info(&registry, &names(&["a", "b", "c", "d", "e"]), 2, &mut warnings).unwrap();
        assert_eq!(info.len(), 2);

        let mut calls = registry.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![1, 2, 2]);
        assert_eq!(warnings.missing, names(&["c", "d", "e"]));
    }

    #[test]
    fn test_fetch_info_aggregates_failures() {
        let registry = ChunkRegistry {
            packages: vec![RemotePackage::new("a", "1")],
            fail_on: Some("c".to_string()),
            calls: Mutex::new(Vec::new()),
        };
        let mut warnings = RegistryWarnings::default();

        let err = fetch_info(&registry, &names(&["a", "b", "c"]), 1, &mut warnings).unwrap_err();
        match err {
            Error::RegistryFetch(failures) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].contains("chunk with c failed"));
            }
            other => panic!("unexpected error: {}", other),
        }
        // Sibling chunks still ran
        assert_eq!(registry.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_warnings_record() {
        let orphan = RemotePackage::new("orphan", "1");
        let mut stale = RemotePackage::new("stale", "1");
        stale.maintainer = Some("someone".to_string());
        stale.out_of_date = Some(1);

        let mut warnings = RegistryWarnings::new(vec!["ignored".to_string()]);
        warnings.record(
            &names(&["orphan", "stale", "gone", "ignored"]),
            &[orphan, stale],
        );

        assert_eq!(warnings.orphans, names(&["orphan"]));
        assert_eq!(warnings.out_of_date, names(&["stale"]));
        assert_eq!(warnings.missing, names(&["gone"]));
        assert!(!warnings.is_empty());
    }
}
