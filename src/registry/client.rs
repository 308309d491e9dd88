// src/registry/client.rs

//! Blocking HTTP client for the AUR RPC interface (version 5)

use super::{Registry, RemotePackage};
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const RPC_VERSION: &str = "5";

/// Envelope of every RPC reply
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<RemotePackage>,
}

impl RpcResponse {
    fn into_results(self) -> Result<Vec<RemotePackage>> {
        if let Some(error) = self.error {
            return Err(Error::RegistryError(error));
        }
        if self.kind == "error" {
            return Err(Error::RegistryError("unknown RPC error".to_string()));
        }
        Ok(self.results)
    }
}

pub struct AurClient {
    client: Client,
    rpc_url: Url,
}

impl AurClient {
    /// Create a client for the AUR at `base_url`, e.g. `https://aur.archlinux.org`
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| Error::ConfigError(format!("Invalid AUR URL {}: {}", base_url, e)))?;
        let rpc_url = base
            .join("rpc/")
            .map_err(|e| Error::ConfigError(format!("Invalid AUR URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("auric/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, rpc_url })
    }

    fn info_url(&self, names: &[String]) -> Url {
        let mut url = self.rpc_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("v", RPC_VERSION).append_pair("type", "info");
            for name in names {
                query.append_pair("arg[]", name);
            }
        }
        url
    }

    fn search_url(&self, needle: &str) -> Url {
        let mut url = self.rpc_url.clone();
        url.query_pairs_mut()
            .append_pair("v", RPC_VERSION)
            .append_pair("type", "search")
            .append_pair("by", "name-desc")
            .append_pair("arg", needle);
        url
    }

    fn request(&self, url: Url) -> Result<Vec<RemotePackage>> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body: RpcResponse = response.json()?;
        body.into_results()
    }
}

impl Registry for AurClient {
    fn info(&self, names: &[String]) -> Result<Vec<RemotePackage>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.request(self.info_url(names))
    }

    fn search(&self, query: &str) -> Result<Vec<RemotePackage>> {
        self.request(self.search_url(query))
    }
}
