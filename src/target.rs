// src/target.rs

//! User-supplied package references
//!
//! A target is what the user typed on the command line: an optional source
//! database prefix (`core/`, `aur/`), a name, and an optional constraint.

use crate::config::TargetMode;
use crate::version::{DepMod, Depend};
use std::fmt;
use tracing::warn;

/// Database prefix that routes a target to the AUR only
pub const AUR_DB: &str = "aur";

/// A parsed package reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Source database, empty when none was given
    pub db: String,
    pub name: String,
    pub op: DepMod,
    pub version: String,
}

impl Target {
    /// Parse `[db/]name[op version]`
    pub fn parse(s: &str) -> Self {
        let (db, dep) = split_db_from_name(s);
        let Depend { name, op, version } = Depend::parse(dep);

        Self {
            db: db.to_string(),
            name,
            op,
            version,
        }
    }

    /// The dependency string without the database prefix
    pub fn dep_string(&self) -> String {
        format!("{}{}{}", self.name, self.op, self.version)
    }

    pub fn is_aur(&self) -> bool {
        self.db == AUR_DB
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.db.is_empty() {
            write!(f, "{}/", self.db)?;
        }
        write!(f, "{}", self.dep_string())
    }
}

/// Split `db/name` into its parts; no slash means no database
pub fn split_db_from_name(s: &str) -> (&str, &str) {
    match s.split_once('/') {
        Some((db, name)) => (db, name),
        None => ("", s),
    }
}

/// Drop targets that cannot be honoured under `mode`
///
/// `aur/` targets make no sense when only repositories are searched, and a
/// repository prefix makes no sense when only the AUR is searched.
pub fn remove_invalid_targets(targets: &[String], mode: TargetMode) -> Vec<String> {
    targets
        .iter()
        .filter(|target| {
            let (db, name) = split_db_from_name(target);

            match Depend::try_parse(name) {
                Some(dep) if !dep.name.is_empty() => {}
                _ => {
                    warn!("{}: invalid target -- skipping", target);
                    return false;
                }
            }

            if db == AUR_DB && mode == TargetMode::Repo {
                warn!("{}: can't use target with option --repo -- skipping", target);
                return false;
            }

            if db != AUR_DB && !db.is_empty() && mode == TargetMode::Aur {
                warn!("{}: can't use target with option --aur -- skipping", target);
                return false;
            }

            true
        })
        .cloned()
        .collect()
}
