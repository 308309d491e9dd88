// src/alpm/desc.rs

//! Parser for pacman `desc` / `depends` database entries
//!
//! Entries are blocks of `%KEY%` headers followed by one value per line and
//! terminated by a blank line.

use super::RepoPackage;
use crate::error::{Error, Result};

/// Parse the concatenated `desc` (and optionally `depends`) content of one package
pub fn parse_desc(content: &str) -> Result<RepoPackage> {
    let mut pkg = RepoPackage::default();
    let mut key: Option<&str> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() {
            key = None;
            continue;
        }

        if line.len() > 2 && line.starts_with('%') && line.ends_with('%') {
            key = Some(&line[1..line.len() - 1]);
            continue;
        }

        let Some(current) = key else {
            continue;
        };

        let value = line.to_string();
        match current {
            "NAME" => pkg.name = value,
            "VERSION" => pkg.version = value,
            "DESC" => pkg.description = Some(value),
            "DEPENDS" => pkg.depends.push(value),
            "OPTDEPENDS" => pkg.optdepends.push(value),
            "PROVIDES" => pkg.provides.push(value),
            "CONFLICTS" => pkg.conflicts.push(value),
            "GROUPS" => pkg.groups.push(value),
            _ => {} // Ignore unknown keys
        }
    }

    if pkg.name.is_empty() || pkg.version.is_empty() {
        return Err(Error::ParseError(
            "desc entry is missing %NAME% or %VERSION%".to_string(),
        ));
    }

    Ok(pkg)
}
