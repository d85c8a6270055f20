use std::env;

use anyhow::{Context, Result};
use reqwest::Url;

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com/";
pub const DEFAULT_TRANSFER_ENDPOINT: &str = "https://storagetransfer.googleapis.com/";
pub const DEFAULT_ASSET_ENDPOINT: &str = "https://cloudasset.googleapis.com/";

/// Base URLs of the three services the samples talk to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub storage: Url,
    pub transfer: Url,
    pub asset: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            storage: Url::parse(DEFAULT_STORAGE_ENDPOINT).expect("valid storage endpoint"),
            transfer: Url::parse(DEFAULT_TRANSFER_ENDPOINT).expect("valid transfer endpoint"),
            asset: Url::parse(DEFAULT_ASSET_ENDPOINT).expect("valid asset endpoint"),
        }
    }
}

impl Endpoints {
    /// Points every service at the same base URL. Useful for tests with a mock server.
    pub fn all_at(base_url: &Url) -> Self {
        Self {
            storage: base_url.clone(),
            transfer: base_url.clone(),
            asset: base_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: Option<String>,
    pub access_token: String,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            project_id: None,
            access_token: access_token.into(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let access_token = lookup("GOOGLE_OAUTH_ACCESS_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context(
                "Missing env GOOGLE_OAUTH_ACCESS_TOKEN (try `gcloud auth print-access-token`)",
            )?;
        let project_id = lookup("GOOGLE_CLOUD_PROJECT")
            .or_else(|| lookup("GCLOUD_PROJECT"))
            .filter(|p| !p.trim().is_empty());

        let mut endpoints = Endpoints::default();
        if let Some(url) = lookup("CLOUD_SAMPLES_STORAGE_ENDPOINT") {
            endpoints.storage = parse_endpoint("CLOUD_SAMPLES_STORAGE_ENDPOINT", &url)?;
        }
        if let Some(url) = lookup("CLOUD_SAMPLES_TRANSFER_ENDPOINT") {
            endpoints.transfer = parse_endpoint("CLOUD_SAMPLES_TRANSFER_ENDPOINT", &url)?;
        }
        if let Some(url) = lookup("CLOUD_SAMPLES_ASSET_ENDPOINT") {
            endpoints.asset = parse_endpoint("CLOUD_SAMPLES_ASSET_ENDPOINT", &url)?;
        }

        Ok(Self {
            project_id,
            access_token: access_token.trim().to_string(),
            endpoints,
        })
    }
}

fn parse_endpoint(var: &str, raw: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends with a slash
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).with_context(|| format!("Invalid URL in env {}: {}", var, raw))
}
