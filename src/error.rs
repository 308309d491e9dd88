// src/error.rs

//! Error types shared by the resolver, the database loader and the registry client

use crate::resolver::MissingDependency;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    /// The registry answered but reported an error of its own
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// One or more chunks of a batched registry fetch failed
    #[error("{}", .0.join("\n"))]
    RegistryFetch(Vec<String>),

    #[error("Could not find all required packages:\n{}", format_missing(.0))]
    MissingDependencies(Vec<MissingDependency>),

    #[error("package conflicts can not be resolved with noconfirm, aborting")]
    UnresolvableConflicts,

    /// A provider menu was shown but no choice could be read
    #[error("No provider selected for {0}")]
    NoProviderSelected(String),
}

fn format_missing(missing: &[MissingDependency]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::DownloadError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_fetch_joins_failures() {
        let err = Error::RegistryFetch(vec!["chunk 1 failed".to_string(), "chunk 2 failed".to_string()]);
        assert_eq!(err.to_string(), "chunk 1 failed\nchunk 2 failed");
    }

    #[test]
    fn test_missing_dependencies_display() {
        let err = Error::MissingDependencies(vec![
            MissingDependency {
                dependency: "foo".to_string(),
                chains: vec![vec![]],
            },
            MissingDependency {
                dependency: "bar>=2".to_string(),
                chains: vec![vec!["baz".to_string(), "qux".to_string()]],
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("foo (Target)"));
        assert!(text.contains("bar>=2 (Wanted by: baz -> qux)"));
    }
}
