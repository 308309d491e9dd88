// src/resolver/pool.rs

//! Resolution state and dependency discovery
//!
//! A [`Pool`] collects everything a set of targets needs, drawn from the sync
//! repositories and the AUR. Discovery is recursive; it terminates because a
//! name is never fetched again once it is in the registry cache and never
//! resolved again once it is in `repo` or `remote`.

use crate::alpm::{LocalDb, RepoPackage};
use crate::config::{Config, RebuildMode, TargetMode};
use crate::error::Result;
use crate::registry::{Registry, RegistryWarnings, RemotePackage, fetch_info};
use crate::target::{Target, remove_invalid_targets};
use crate::version::{Depend, satisfies_name, satisfies_provide};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, BufReader};
use std::sync::Mutex;
use tracing::{debug, info};

/// Per-call resolution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub mode: TargetMode,
    /// Prefer a provider named like one of the targets over asking
    pub ignore_providers: bool,
    /// Never prompt; the first provider wins
    pub no_confirm: bool,
    /// Search the registry for alternative providers
    pub provides: bool,
    pub rebuild: RebuildMode,
    /// Maximum names per registry info request
    pub split_n: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Config::default().resolve_options()
    }
}

/// The state of an in-progress resolution
pub struct Pool<'a> {
    pub(super) targets: Vec<Target>,
    pub(super) explicit: BTreeSet<String>,
    pub(super) repo: BTreeMap<String, RepoPackage>,
    pub(super) remote: BTreeMap<String, RemotePackage>,
    /// Every record ever fetched, including speculative provider candidates
    pub(super) remote_cache: BTreeMap<String, RemotePackage>,
    pub(super) groups: Vec<String>,
    pub(super) warnings: RegistryWarnings,
    pub(super) db: &'a dyn LocalDb,
    pub(super) registry: &'a dyn Registry,
    /// Source of provider menu answers
    pub(super) input: Mutex<Box<dyn BufRead + Send>>,
}

impl<'a> Pool<'a> {
    pub fn new(db: &'a dyn LocalDb, registry: &'a dyn Registry) -> Self {
        Self {
            targets: Vec::new(),
            explicit: BTreeSet::new(),
            repo: BTreeMap::new(),
            remote: BTreeMap::new(),
            remote_cache: BTreeMap::new(),
            groups: Vec::new(),
            warnings: RegistryWarnings::default(),
            db,
            registry,
            input: Mutex::new(Box::new(BufReader::new(io::stdin()))),
        }
    }

    /// Read provider menu answers from `input` instead of stdin
    pub fn with_input(mut self, input: impl BufRead + Send + 'static) -> Self {
        self.input = Mutex::new(Box::new(input));
        self
    }

    /// Exempt `names` from registry warnings
    pub fn with_ignored_warnings(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.warnings = RegistryWarnings::new(names);
        self
    }

    /// Build a pool and resolve `targets` into it
    pub fn resolve(
        targets: &[String],
        db: &'a dyn LocalDb,
        registry: &'a dyn Registry,
        opts: &ResolveOptions,
    ) -> Result<Self> {
        let mut pool = Self::new(db, registry);
        pool.resolve_targets(targets, opts)?;
        Ok(pool)
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Names the user asked for, as opposed to pulled-in dependencies
    pub fn explicit(&self) -> &BTreeSet<String> {
        &self.explicit
    }

    pub fn repo(&self) -> &BTreeMap<String, RepoPackage> {
        &self.repo
    }

    pub fn remote(&self) -> &BTreeMap<String, RemotePackage> {
        &self.remote
    }

    pub fn remote_cache(&self) -> &BTreeMap<String, RemotePackage> {
        &self.remote_cache
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn warnings(&self) -> &RegistryWarnings {
        &self.warnings
    }

    /// Resolve user targets, including `db/` prefixes and group names
    ///
    /// Targets already present in the pool are skipped, so calling this twice
    /// with the same names changes nothing.
    pub fn resolve_targets(&mut self, pkgs: &[String], opts: &ResolveOptions) -> Result<()> {
        // Registry requests are slow; batch every registry target into one round
        let mut remote_targets = BTreeSet::new();

        for pkg in remove_invalid_targets(pkgs, opts.mode) {
            let target = Target::parse(&pkg);
            let dep = target.dep_string();

            // pacman skips satisfied targets even when another db was named
            let seen = self.targets.contains(&target);
            if seen || self.has_satisfier(&dep) || self.has_package(&dep) {
                debug!("{} already resolved", target);
                continue;
            }

            if target.is_aur() || opts.mode == TargetMode::Aur {
                self.targets.push(target);
                remote_targets.insert(dep);
                continue;
            }

            let found = if target.db.is_empty() {
                self.db.sync_satisfier(&dep)
            } else {
                self.db.satisfier_from_db(&dep, &target.db)
            };

            if let Some(repo_pkg) = found {
                self.targets.push(target);
                self.explicit.insert(repo_pkg.name.clone());
                self.resolve_repo_dependency(repo_pkg);
                continue;
            }

            // Groups are only checked for existence; members are not resolved
            let members = self.db.packages_from_group(&target.name);
            if !members.is_empty() {
                self.groups.push(target.to_string());
                self.explicit.extend(members.into_iter().map(|p| p.name));
                continue;
            }

            if target.db.is_empty() {
                remote_targets.insert(dep);
            }
            self.targets.push(target);
        }

        if !remote_targets.is_empty() && opts.mode.allows_aur() {
            self.resolve_remote(remote_targets, true, opts)?;
            self.warnings.log();
        }

        Ok(())
    }

    /// Fetch registry records for every uncached dependency in `pkgs`
    fn cache_remote(&mut self, pkgs: &BTreeSet<String>, opts: &ResolveOptions) -> Result<()> {
        let mut pkgs: BTreeSet<String> = pkgs
            .iter()
            .filter(|p| !self.remote_cache.contains_key(*p))
            .cloned()
            .collect();

        if pkgs.is_empty() {
            return Ok(());
        }

        if opts.provides {
            let candidates = self.find_provides(&pkgs);
            pkgs.extend(candidates);
        }

        // The RPC does not understand constraints; ask for `name` and `name-ver`
        let mut seen = BTreeSet::new();
        let mut to_query = Vec::new();
        for pkg in &pkgs {
            if self.remote_cache.contains_key(pkg) {
                continue;
            }

            let dep = Depend::parse(pkg);
            let mut names = vec![dep.name.clone()];
            if !dep.version.is_empty() {
                names.push(format!("{}-{}", dep.name, dep.version));
            }

            for name in names {
                if seen.insert(name.clone()) {
                    to_query.push(name);
                }
            }
        }

        let info = fetch_info(self.registry, &to_query, opts.split_n, &mut self.warnings)?;
        debug!("Cached {} registry records", info.len());

        for pkg in info {
            self.remote_cache.insert(pkg.name.clone(), pkg);
        }

        Ok(())
    }

    /// Search the registry for packages that might provide each of `pkgs`
    ///
    /// Searching "java-environment" as "java" finds far more providers than
    /// searching for the dependency name verbatim, so each name is tried
    /// with trailing `-` segments dropped until a search returns something.
    /// Returns every uncached candidate name so its full record gets fetched
    /// with the rest of the batch.
    pub(super) fn find_provides(&self, pkgs: &BTreeSet<String>) -> BTreeSet<String> {
        let queries: Vec<String> = pkgs
            .iter()
            .map(|p| Depend::parse(p).name)
            .filter(|name| self.db.local_package(name).is_none())
            .collect();

        let found = Mutex::new(BTreeSet::new());

        queries.par_iter().for_each(|name| {
            let results = self.search_prefixes(name);
            let mut found = match found.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for pkg in results {
                if !self.remote_cache.contains_key(&pkg.name) {
                    found.insert(pkg.name);
                }
            }
        });

        match found.into_inner() {
            Ok(found) => found,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn search_prefixes(&self, name: &str) -> Vec<RemotePackage> {
        let words: Vec<&str> = name.split('-').collect();

        for len in (1..=words.len()).rev() {
            let query = words[..len].join("-");
            match self.registry.search(&query) {
                Ok(results) if !results.is_empty() => return results,
                Ok(_) => {}
                Err(e) => debug!("Search for {} failed: {}", query, e),
            }
        }

        Vec::new()
    }

    /// Resolve registry dependencies, one round per recursion level
    fn resolve_remote(
        &mut self,
        pkgs: BTreeSet<String>,
        explicit: bool,
        opts: &ResolveOptions,
    ) -> Result<()> {
        if pkgs.is_empty() {
            return Ok(());
        }

        self.cache_remote(&pkgs, opts)?;

        let mut new_deps = BTreeSet::new();
        for name in &pkgs {
            if self.remote.contains_key(name) {
                continue;
            }

            // Unsatisfied names are reported by the missing check
            let Some(pkg) = self.find_satisfier_remote_cache(name, opts)? else {
                continue;
            };

            // A name comes from one source only; the missing check reports the constraint
            if self.repo.contains_key(&pkg.name) {
                debug!("{} already selected from a repository", pkg.name);
                continue;
            }

            if explicit {
                self.explicit.insert(pkg.name.clone());
            }
            for deps in pkg.dependency_lists() {
                new_deps.extend(deps.iter().cloned());
            }

            info!("{} {} selected from AUR", pkg.name, pkg.version);
            self.remote.insert(pkg.name.clone(), pkg);
        }

        let mut next_round = BTreeSet::new();
        for dep in new_deps {
            if self.has_satisfier(&dep) {
                continue;
            }

            let installed = self.db.local_satisfier_exists(&dep);
            let repo_pkg = self.db.sync_satisfier(&dep);

            // rebuild=tree re-resolves installed AUR deps unless the repo has them
            if installed && (!opts.rebuild.rebuilds_installed_deps() || repo_pkg.is_some()) {
                continue;
            }

            if let Some(repo_pkg) = repo_pkg {
                self.resolve_repo_dependency(repo_pkg);
                continue;
            }

            next_round.insert(dep);
        }

        self.resolve_remote(next_round, false, opts)
    }

    /// Add a repository package and close over its repository dependencies
    ///
    /// Never reaches into the registry: the sync repositories are expected to
    /// be self-contained. A package whose name was already selected from the
    /// AUR is left out.
    pub fn resolve_repo_dependency(&mut self, pkg: RepoPackage) {
        if self.remote.contains_key(&pkg.name) {
            debug!("{} already selected from AUR", pkg.name);
            return;
        }

        let depends = self.db.package_depends(&pkg);
        self.repo.insert(pkg.name.clone(), pkg);

        for dep in depends {
            if self.has_satisfier(&dep) {
                continue;
            }

            if self.db.local_satisfier_exists(&dep) {
                continue;
            }

            if let Some(repo_pkg) = self.db.sync_satisfier(&dep) {
                self.resolve_repo_dependency(repo_pkg);
            }
        }
    }

    /// Whether a resolved repository package satisfies `dep`
    pub(super) fn repo_satisfies(&self, pkg: &RepoPackage, dep: &str) -> bool {
        satisfies_name(&pkg.name, &pkg.version, dep)
            || self
                .db
                .package_provides(pkg)
                .iter()
                .any(|p| satisfies_provide(p, dep, &pkg.version))
    }

    pub fn find_satisfier_remote(&self, dep: &str) -> Option<&RemotePackage> {
        self.remote.values().find(|pkg| pkg.satisfies(dep))
    }

    pub fn find_satisfier_repo(&self, dep: &str) -> Option<&RepoPackage> {
        self.repo.values().find(|pkg| self.repo_satisfies(pkg, dep))
    }

    pub fn has_satisfier(&self, dep: &str) -> bool {
        self.find_satisfier_repo(dep).is_some() || self.find_satisfier_remote(dep).is_some()
    }

    /// Whether `name` is resolved from either source or selected as a group
    pub fn has_package(&self, name: &str) -> bool {
        self.repo.contains_key(name)
            || self.remote.contains_key(name)
            || self.groups.iter().any(|g| g == name)
    }
}
