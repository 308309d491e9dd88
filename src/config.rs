// src/config.rs

//! Persistent configuration
//!
//! Settings live in `$XDG_CONFIG_HOME/auric/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine:
//!
//! ```toml
//! aur_url = "https://aur.archlinux.org"
//! request_split_n = 150
//! provides = true
//! rebuild = "tree"
//! mode = "any"
//! ignore = ["some-orphan"]
//! ```

use crate::error::{Error, Result};
use crate::resolver::ResolveOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Which package sources a resolution may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Repositories first, then the AUR
    #[default]
    Any,
    /// AUR only
    Aur,
    /// Repositories only
    Repo,
}

impl TargetMode {
    pub fn allows_aur(&self) -> bool {
        matches!(self, TargetMode::Any | TargetMode::Aur)
    }
}

/// When AUR packages that are already installed get rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RebuildMode {
    #[default]
    No,
    /// Rebuild explicit targets
    Yes,
    /// Rebuild targets and every installed AUR dependency without a repo replacement
    Tree,
    /// Rebuild regardless of installed versions
    All,
}

impl RebuildMode {
    /// Whether installed AUR dependencies are resolved again
    ///
    /// `yes` and `all` only affect the explicit targets, which are always
    /// resolved.
    pub fn rebuilds_installed_deps(&self) -> bool {
        match self {
            RebuildMode::Tree => true,
            RebuildMode::No | RebuildMode::Yes | RebuildMode::All => false,
        }
    }
}

impl std::fmt::Display for RebuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebuildMode::No => write!(f, "no"),
            RebuildMode::Yes => write!(f, "yes"),
            RebuildMode::Tree => write!(f, "tree"),
            RebuildMode::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the AUR
    pub aur_url: String,

    /// Maximum number of names per RPC info request
    pub request_split_n: usize,

    /// Search the AUR for packages providing a dependency
    pub provides: bool,

    pub rebuild: RebuildMode,

    /// Leave conflict resolution to pacman's own prompt
    pub use_ask: bool,

    /// Never prompt; take defaults
    pub no_confirm: bool,

    pub mode: TargetMode,

    /// pacman database directory
    pub db_path: PathBuf,

    pub pacman_conf: PathBuf,

    /// Packages exempt from AUR warnings
    pub ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aur_url: "https://aur.archlinux.org".to_string(),
            request_split_n: 150,
            provides: true,
            rebuild: RebuildMode::No,
            use_ask: false,
            no_confirm: false,
            mode: TargetMode::Any,
            db_path: PathBuf::from("/var/lib/pacman"),
            pacman_conf: PathBuf::from("/etc/pacman.conf"),
            ignore: Vec::new(),
        }
    }
}

impl Config {
    /// Default location of the configuration file, if a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("auric").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`, or the default location when `None`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.request_split_n == 0 {
            return Err(Error::ConfigError(
                "request_split_n must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Options threaded into every resolution call
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            mode: self.mode,
            ignore_providers: false,
            no_confirm: self.no_confirm,
            provides: self.provides,
            rebuild: self.rebuild,
            split_n: self.request_split_n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.request_split_n, 150);
        assert!(config.provides);
        assert_eq!(config.rebuild, RebuildMode::No);
        assert_eq!(config.mode, TargetMode::Any);
    }

    #[test]
    fn test_rebuild_modes() {
        for (value, deps) in [("no", false), ("yes", false), ("tree", true), ("all", false)] {
            let config = Config::parse(&format!("rebuild = \"{}\"", value)).unwrap();
            assert_eq!(config.rebuild.to_string(), value);
            assert_eq!(config.rebuild.rebuilds_installed_deps(), deps);
        }
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::parse(
            r#"
            rebuild = "tree"
            mode = "aur"
            provides = false
            ignore = ["foo"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rebuild, RebuildMode::Tree);
        assert_eq!(config.mode, TargetMode::Aur);
        assert!(!config.provides);
        assert_eq!(config.ignore, vec!["foo".to_string()]);
        assert_eq!(config.aur_url, "https://aur.archlinux.org");
    }

    #[test]
    fn test_parse_rejects_zero_split() {
        assert!(Config::parse("request_split_n = 0").is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.request_split_n, 150);
    }

    #[test]
    fn test_resolve_options_follow_config() {
        let mut config = Config::default();
        config.no_confirm = true;
        config.request_split_n = 10;
        let opts = config.resolve_options();
        assert!(opts.no_confirm);
        assert_eq!(opts.split_n, 10);
        assert!(opts.provides);
    }
}
