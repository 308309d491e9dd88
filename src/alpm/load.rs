// src/alpm/load.rs

//! Load pacman's on-disk databases into a [`PackageDb`]
//!
//! Layout under the database path (normally `/var/lib/pacman`):
//! - `local/<name>-<version>/desc` for every installed package
//! - `sync/<repo>.db`, a tarball of `<name>-<version>/desc` entries per repository
//!
//! Repository order comes from the sections of `pacman.conf`.

use super::{PackageDb, RepoPackage, parse_desc};
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use tar::Archive;
use tracing::{debug, info, warn};

/// Extract repository names from `pacman.conf`, in declaration order
pub fn parse_pacman_conf(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter(|section| !section.is_empty() && *section != "options")
        .map(str::to_string)
        .collect()
}

/// Read every installed package from a `local` database directory
pub fn load_local_db(dir: &Path) -> Result<Vec<RepoPackage>> {
    let mut packages = Vec::new();

    let entries = fs::read_dir(dir).map_err(|e| {
        Error::DatabaseError(format!("Failed to read local database {}: {}", dir.display(), e))
    })?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let desc_path = path.join("desc");
        if !desc_path.exists() {
            continue;
        }

        let mut content = fs::read_to_string(&desc_path)?;
        // Older database versions keep dependencies in a separate file
        let depends_path = path.join("depends");
        if depends_path.exists() {
            content.push('\n');
            content.push_str(&fs::read_to_string(&depends_path)?);
        }

        match parse_desc(&content) {
            Ok(pkg) => packages.push(pkg),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    debug!("Loaded {} installed packages from {}", packages.len(), dir.display());
    Ok(packages)
}

/// Open a sync database, detecting gzip or zstd compression from magic bytes
fn open_archive(data: Vec<u8>) -> Result<Archive<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if data.starts_with(&[0x1f, 0x8b]) {
        Box::new(GzDecoder::new(Cursor::new(data)))
    } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
        let decoder = zstd::Decoder::new(Cursor::new(data))
            .map_err(|e| Error::DatabaseError(format!("Failed to create zstd decoder: {}", e)))?;
        Box::new(decoder)
    } else {
        Box::new(Cursor::new(data))
    };

    Ok(Archive::new(reader))
}

/// Read every package from a sync database archive
pub fn load_sync_db(path: &Path) -> Result<Vec<RepoPackage>> {
    let data = fs::read(path).map_err(|e| {
        Error::DatabaseError(format!("Failed to read sync database {}: {}", path.display(), e))
    })?;

    let mut archive = open_archive(data)?;

    // Entry directory -> concatenated desc/depends content
    let mut contents: BTreeMap<String, String> = BTreeMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.to_path_buf();

        let is_metadata = matches!(
            entry_path.file_name().and_then(|n| n.to_str()),
            Some("desc") | Some("depends")
        );
        if !is_metadata {
            continue;
        }

        let Some(dir) = entry_path.parent().and_then(|p| p.to_str()) else {
            continue;
        };

        let mut content = String::new();
        entry.read_to_string(&mut content)?;

        let slot = contents.entry(dir.to_string()).or_default();
        slot.push_str(&content);
        slot.push('\n');
    }

    let mut packages = Vec::with_capacity(contents.len());
    for (dir, content) in contents {
        match parse_desc(&content) {
            Ok(pkg) => packages.push(pkg),
            Err(e) => warn!("Skipping {} in {}: {}", dir, path.display(), e),
        }
    }

    debug!("Loaded {} packages from {}", packages.len(), path.display());
    Ok(packages)
}

/// Load the local database and every sync database named in `pacman.conf`
///
/// A repository whose sync database has not been downloaded yet is skipped
/// with a warning.
pub fn load(db_path: &Path, pacman_conf: &Path) -> Result<PackageDb> {
    let conf = fs::read_to_string(pacman_conf).map_err(|e| {
        Error::ConfigError(format!("Failed to read {}: {}", pacman_conf.display(), e))
    })?;

    let mut db = PackageDb::new();

    for repo in parse_pacman_conf(&conf) {
        let path = db_path.join("sync").join(format!("{}.db", repo));
        if !path.exists() {
            warn!("Sync database for {} not found at {}", repo, path.display());
            continue;
        }
        db.add_sync_db(repo, load_sync_db(&path)?);
    }

    for pkg in load_local_db(&db_path.join("local"))? {
        db.add_local(pkg);
    }

    info!(
        "Loaded {} sync repositories and {} installed packages",
        db.sync_dbs().len(),
        db.local_count()
    );
    Ok(db)
}
