// src/resolver/missing.rs

//! Verify that every dependency of every target has a satisfier in the pool

use super::pool::Pool;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::debug;

/// A dependency nothing in the pool satisfies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    pub dependency: String,
    /// Distinct ancestor chains that led here; an empty chain means a target
    pub chains: Vec<Vec<String>>,
}

impl fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if chain.is_empty() {
                write!(f, "  {} (Target)", self.dependency)?;
            } else {
                write!(f, "  {} (Wanted by: {})", self.dependency, chain.join(" -> "))?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MissingWalk {
    good: HashSet<String>,
    missing: BTreeMap<String, Vec<Vec<String>>>,
}

impl Pool<'_> {
    /// Fail with [`Error::MissingDependencies`] if any dependency is unsatisfiable
    pub fn check_missing(&self) -> Result<()> {
        let missing = self.find_missing();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::MissingDependencies(missing))
    }

    /// Every unsatisfiable dependency, sorted by dependency string
    pub fn find_missing(&self) -> Vec<MissingDependency> {
        let mut walk = MissingWalk::default();

        for target in &self.targets {
            self.walk_missing(&target.dep_string(), &[], &mut walk);
        }

        debug!(
            "Missing check: {} satisfied, {} missing",
            walk.good.len(),
            walk.missing.len()
        );

        walk.missing
            .into_iter()
            .map(|(dependency, chains)| MissingDependency { dependency, chains })
            .collect()
    }

    fn walk_missing(&self, dep: &str, stack: &[String], walk: &mut MissingWalk) {
        if walk.good.contains(dep) {
            return;
        }

        if let Some(chains) = walk.missing.get_mut(dep) {
            if !chains.iter().any(|chain| chain == stack) {
                chains.push(stack.to_vec());
            }
            return;
        }

        if let Some(pkg) = self.find_satisfier_remote(dep) {
            walk.good.insert(dep.to_string());
            let chain = extend_chain(stack, &pkg.name);
            for deps in pkg.dependency_lists() {
                self.walk_children(deps, &chain, walk);
            }
            return;
        }

        if let Some(pkg) = self.find_satisfier_repo(dep) {
            walk.good.insert(dep.to_string());
            let chain = extend_chain(stack, &pkg.name);
            self.walk_children(&self.db.package_depends(pkg), &chain, walk);
            return;
        }

        walk.missing.insert(dep.to_string(), vec![stack.to_vec()]);
    }

    fn walk_children(&self, deps: &[String], chain: &[String], walk: &mut MissingWalk) {
        for dep in deps {
            if self.db.local_satisfier_exists(dep) {
                walk.good.insert(dep.clone());
                continue;
            }
            self.walk_missing(dep, chain, walk);
        }
    }
}

fn extend_chain(stack: &[String], name: &str) -> Vec<String> {
    let mut chain = stack.to_vec();
    chain.push(name.to_string());
    chain
}
