#![allow(dead_code)]

use std::sync::Arc;

use cloud_samples::harness::SampleRunner;
use cloud_samples::{CloudClient, Config, Endpoints};
use httpmock::MockServer;
use reqwest::Url;

pub const PROJECT_ID: &str = "test-project";
pub const TOKEN: &str = "test-token";

pub fn mock_client(server: &MockServer) -> Arc<CloudClient> {
    let base = Url::parse(&server.base_url()).unwrap();
    let cfg = Config::new(TOKEN)
        .with_project_id(PROJECT_ID)
        .with_endpoints(Endpoints::all_at(&base));
    Arc::new(CloudClient::new(cfg).unwrap())
}

/// A client whose endpoints refuse connections; for paths that must not touch the network.
pub fn offline_client() -> Arc<CloudClient> {
    let base = Url::parse("http://127.0.0.1:9/").unwrap();
    let cfg = Config::new(TOKEN)
        .with_project_id(PROJECT_ID)
        .with_endpoints(Endpoints::all_at(&base));
    Arc::new(CloudClient::new(cfg).unwrap())
}

/// Runner for the crate's own binary, wired to the mock server.
pub fn samples_runner(server: &MockServer) -> SampleRunner {
    SampleRunner::for_samples_binary(env!("CARGO_BIN_EXE_cloud-samples"))
        .env("GOOGLE_OAUTH_ACCESS_TOKEN", TOKEN)
        .env("GOOGLE_CLOUD_PROJECT", PROJECT_ID)
        .env("CLOUD_SAMPLES_STORAGE_ENDPOINT", server.base_url())
        .env("CLOUD_SAMPLES_TRANSFER_ENDPOINT", server.base_url())
        .env("CLOUD_SAMPLES_ASSET_ENDPOINT", server.base_url())
        .env("RUST_LOG", "off")
}
