use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    client::CloudClient,
    config::Config,
    logging,
    transfer::TransferJob,
    util::TRANSFER_SUCCESS_MARKER,
};

/// Subcommand names of every sample the binary exposes.
pub const SAMPLES: &[&str] = &["get-saved-query", "list-saved-queries", "posix-request"];

#[derive(Parser, Debug)]
#[command(
    name = "cloud-samples",
    version,
    about = "Cloud Asset Inventory and Storage Transfer samples",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a saved query by its full resource name
    GetSavedQuery {
        /// projects/<PROJECT>/savedQueries/<QUERY_ID>
        full_query_name: String,
    },
    /// List saved queries in the current project
    ListSavedQueries,
    /// Create and run a transfer job from a POSIX filesystem to a Cloud Storage bucket
    PosixRequest {
        /// Project that owns the transfer job
        project_id: String,
        /// Agent pool for the source; empty for the default pool
        source_agent_pool_name: String,
        /// Root directory on the agents' filesystem to transfer from
        root_directory: String,
        /// Cloud Storage bucket to transfer into
        gcs_sink_bucket: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = Config::from_env()?;
    let client = CloudClient::new(cfg)?;

    match cli.command {
        Commands::GetSavedQuery { full_query_name } => {
            get_saved_query_cmd(&client, &full_query_name).await?
        }
        Commands::ListSavedQueries => list_saved_queries_cmd(&client).await?,
        Commands::PosixRequest {
            project_id,
            source_agent_pool_name,
            root_directory,
            gcs_sink_bucket,
        } => {
            posix_request_cmd(
                &client,
                &project_id,
                &source_agent_pool_name,
                &root_directory,
                &gcs_sink_bucket,
            )
            .await?
        }
    }

    Ok(())
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg.to_string());
    pb
}

async fn get_saved_query_cmd(client: &CloudClient, full_query_name: &str) -> Result<()> {
    let pb = spinner("Loading saved query...");
    let query = client.get_saved_query(full_query_name).await;
    pb.finish_and_clear();
    let query = query.with_context(|| format!("Failed to get saved query {}", full_query_name))?;

    println!("{}", serde_json::to_string_pretty(&query)?);
    Ok(())
}

async fn list_saved_queries_cmd(client: &CloudClient) -> Result<()> {
    let pb = spinner("Loading saved queries...");
    let queries = client.list_project_saved_queries().await;
    pb.finish_and_clear();
    let queries = queries.context("Failed to list saved queries")?;

    println!("{}", serde_json::to_string_pretty(&queries)?);
    Ok(())
}

async fn posix_request_cmd(
    client: &CloudClient,
    project_id: &str,
    source_agent_pool_name: &str,
    root_directory: &str,
    gcs_sink_bucket: &str,
) -> Result<()> {
    let job = TransferJob::posix_to_gcs(
        project_id,
        source_agent_pool_name,
        root_directory,
        gcs_sink_bucket,
    );

    let pb = spinner("Creating transfer job...");
    let created = client.create_transfer_job(&job).await;
    pb.finish_and_clear();
    let created = created.context("Failed to create transfer job")?;

    let pb = spinner("Starting transfer job...");
    let run = client.run_transfer_job(&created.name, project_id).await;
    pb.finish_and_clear();
    run.with_context(|| format!("Failed to run transfer job {}", created.name))?;

    println!(
        "{} from '{}' to '{}' with name {}",
        TRANSFER_SUCCESS_MARKER, root_directory, gcs_sink_bucket, created.name
    );
    Ok(())
}
