use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cloud_samples::cli::run_cli().await
}
