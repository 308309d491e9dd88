// src/resolver/order.rs

//! Build and install order derived from a resolved pool
//!
//! Dependencies are always placed before their dependents. Ordering consumes
//! the pool's `remote` and `repo` maps so each package is placed exactly
//! once no matter how many paths reach it. A package first reached through a
//! build-only edge is promoted to runtime when a runtime edge reaches it later.

use super::pool::Pool;
use crate::alpm::RepoPackage;
use crate::registry::RemotePackage;
use std::collections::BTreeSet;
use std::fmt;

/// Packages built together from one package base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base {
    packages: Vec<RemotePackage>,
}

impl Base {
    fn new(pkg: RemotePackage) -> Self {
        Self { packages: vec![pkg] }
    }

    pub fn pkgbase(&self) -> &str {
        &self.packages[0].package_base
    }

    pub fn version(&self) -> &str {
        &self.packages[0].version
    }

    pub fn packages(&self) -> &[RemotePackage] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Order {
    /// AUR bases to build, in order
    pub remote: Vec<Base>,
    /// Repository packages to install, in order
    pub repo: Vec<RepoPackage>,
    /// Names required at runtime by an explicit target
    pub runtime: BTreeSet<String>,
}

/// Order every target of `pool`, consuming its resolved packages
pub fn get_order(pool: &mut Pool<'_>) -> Order {
    let mut order = Order::default();

    let targets: Vec<String> = pool.targets.iter().map(|t| t.dep_string()).collect();
    for dep in targets {
        if let Some(pkg) = pool.find_satisfier_remote(&dep).cloned() {
            order.order_remote(pool, pkg, true);
        } else if let Some(pkg) = pool.find_satisfier_repo(&dep).cloned() {
            order.order_repo(pool, pkg, true);
        } else {
            order.promote_runtime(pool, &dep);
        }
    }

    order
}

impl Order {
    fn order_remote(&mut self, pool: &mut Pool<'_>, pkg: RemotePackage, runtime: bool) {
        if runtime {
            self.runtime.insert(pkg.name.clone());
        }
        pool.remote.remove(&pkg.name);

        // Only the runtime list keeps the runtime flag
        for (i, deps) in pkg.dependency_lists().into_iter().enumerate() {
            let dep_runtime = runtime && i == 0;
            for dep in deps {
                let mut found = false;
                if let Some(next) = pool.find_satisfier_remote(dep).cloned() {
                    self.order_remote(pool, next, dep_runtime);
                    found = true;
                }
                if let Some(next) = pool.find_satisfier_repo(dep).cloned() {
                    self.order_repo(pool, next, dep_runtime);
                    found = true;
                }
                if !found && dep_runtime {
                    self.promote_runtime(pool, dep);
                }
            }
        }

        match self
            .remote
            .iter_mut()
            .find(|base| base.pkgbase() == pkg.package_base)
        {
            Some(base) => base.packages.push(pkg),
            None => self.remote.push(Base::new(pkg)),
        }
    }

    fn order_repo(&mut self, pool: &mut Pool<'_>, pkg: RepoPackage, runtime: bool) {
        if runtime {
            self.runtime.insert(pkg.name.clone());
        }
        pool.repo.remove(&pkg.name);

        for dep in pool.db.package_depends(&pkg) {
            if let Some(next) = pool.find_satisfier_repo(&dep).cloned() {
                self.order_repo(pool, next, runtime);
            } else if runtime {
                self.promote_runtime(pool, &dep);
            }
        }

        self.repo.push(pkg);
    }

    /// Mark an already ordered satisfier of `dep` and its runtime closure as runtime
    fn promote_runtime(&mut self, pool: &Pool<'_>, dep: &str) {
        let remote = self
            .remote
            .iter()
            .flat_map(|base| base.packages.iter())
            .find(|pkg| pkg.satisfies(dep))
            .map(|pkg| (pkg.name.clone(), pkg.depends.clone()));

        let (name, depends) = match remote {
            Some(found) => found,
            None => match self.repo.iter().find(|pkg| pool.repo_satisfies(pkg, dep)) {
                Some(pkg) => (pkg.name.clone(), pool.db.package_depends(pkg)),
                None => return,
            },
        };

        if self.runtime.insert(name) {
            for dep in &depends {
                self.promote_runtime(pool, dep);
            }
        }
    }

    fn ordered_names(&self) -> impl Iterator<Item = &str> {
        self.remote
            .iter()
            .flat_map(|base| base.packages.iter().map(|p| p.name.as_str()))
            .chain(self.repo.iter().map(|p| p.name.as_str()))
    }

    /// Whether some ordered packages are only needed to build
    pub fn has_make(&self) -> bool {
        self.runtime.len() != self.ordered_names().count()
    }

    /// Packages only needed to build, candidates for removal afterwards
    pub fn make_only(&self) -> Vec<String> {
        self.ordered_names()
            .filter(|name| !self.runtime.contains(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.remote.is_empty() && self.repo.is_empty()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut repo = Vec::new();
        let mut repo_make = Vec::new();
        for pkg in &self.repo {
            let entry = format!("{}-{}", pkg.name, pkg.version);
            if self.runtime.contains(&pkg.name) {
                repo.push(entry);
            } else {
                repo_make.push(entry);
            }
        }

        let (mut aur, mut aur_len) = (Vec::new(), 0);
        let (mut aur_make, mut aur_make_len) = (Vec::new(), 0);
        for base in &self.remote {
            let head = format!("{}-{}", base.pkgbase(), base.version());

            if base.len() == 1 && base.pkgbase() == base.packages[0].name {
                if self.runtime.contains(&base.packages[0].name) {
                    aur.push(head);
                    aur_len += 1;
                } else {
                    aur_make.push(head);
                    aur_make_len += 1;
                }
                continue;
            }

            let (split, split_make): (Vec<&str>, Vec<&str>) = {
                let (run, make): (Vec<_>, Vec<_>) = base
                    .packages
                    .iter()
                    .partition(|p| self.runtime.contains(&p.name));
                (
                    run.iter().map(|p| p.name.as_str()).collect(),
                    make.iter().map(|p| p.name.as_str()).collect(),
                )
            };

            if !split.is_empty() {
                aur_len += split.len();
                aur.push(format!("{} ({})", head, split.join(" ")));
            }
            if !split_make.is_empty() {
                aur_make_len += split_make.len();
                aur_make.push(format!("{} ({})", head, split_make.join(" ")));
            }
        }

        let sections = [
            ("Repo", repo.len(), repo),
            ("Repo Make", repo_make.len(), repo_make),
            ("Aur", aur_len, aur),
            ("Aur Make", aur_make_len, aur_make),
        ];

        for (title, count, entries) in sections {
            if count > 0 {
                writeln!(f, "[{}:{}]  {}", title, count, entries.join("  "))?;
            }
        }

        Ok(())
    }
}
