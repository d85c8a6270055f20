use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {url} failed {status}: {body}")]
    Status {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no project id configured (set GOOGLE_CLOUD_PROJECT)")]
    MissingProject,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Storage,
    Transfer,
    Asset,
}

/// Thin JSON-over-HTTPS client shared by the samples and the test harness.
pub struct CloudClient {
    http: Client,
    config: Config,
}

impl CloudClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("cloud-samples/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()?;
        Ok(Self { http, config })
    }

    pub fn project_id(&self) -> Result<&str, ApiError> {
        self.config
            .project_id
            .as_deref()
            .ok_or(ApiError::MissingProject)
    }

    /// Resolves a path (optionally carrying a query string) against a service base URL.
    pub fn url(&self, service: Service, path: &str) -> Result<Url, ApiError> {
        let base = match service {
            Service::Storage => &self.config.endpoints.storage,
            Service::Transfer => &self.config.endpoints.transfer,
            Service::Asset => &self.config.endpoints.asset,
        };
        base.join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    pub async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(&self.config.access_token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            debug!(%method, %url, %status, "request failed");
            return Err(ApiError::Status {
                method,
                url,
                status,
                body: text,
            });
        }
        debug!(%method, %url, bytes = text.len(), "request ok");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get(&self, service: Service, path: &str) -> Result<Value, ApiError> {
        let url = self.url(service, path)?;
        self.execute(Method::GET, url, None).await
    }

    pub async fn post(&self, service: Service, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(service, path)?;
        self.execute(Method::POST, url, Some(body)).await
    }

    pub async fn patch(&self, service: Service, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(service, path)?;
        self.execute(Method::PATCH, url, Some(body)).await
    }

    pub async fn delete(&self, service: Service, path: &str) -> Result<Value, ApiError> {
        let url = self.url(service, path)?;
        self.execute(Method::DELETE, url, None).await
    }

    /// Collects `items_key` from every page, following `nextPageToken`.
    pub async fn list_all(
        &self,
        service: Service,
        path: &str,
        items_key: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let first = self.url(service, path)?;
        self.list_all_url(first, items_key).await
    }

    pub async fn list_all_url(&self, first: Url, items_key: &str) -> Result<Vec<Value>, ApiError> {
        let mut items: Vec<Value> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = first.clone();
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let v = self.execute(Method::GET, url, None).await?;
            if let Some(data) = v.get(items_key).and_then(|d| d.as_array()) {
                items.extend(data.iter().cloned());
            }
            page_token = v
                .get("nextPageToken")
                .and_then(|n| n.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }
        Ok(items)
    }
}
