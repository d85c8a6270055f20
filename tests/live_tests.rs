//! Runs against real Google Cloud APIs. Needs `GOOGLE_OAUTH_ACCESS_TOKEN` and
//! `GOOGLE_CLOUD_PROJECT`, plus a transfer agent pool able to read the local
//! scratch directory:
//!
//! ```bash
//! GOOGLE_OAUTH_ACCESS_TOKEN=$(gcloud auth print-access-token) \
//! GOOGLE_CLOUD_PROJECT=my-project \
//!     cargo test --features live-tests --test live_tests
//! ```
#![cfg(feature = "live-tests")]

use std::sync::Arc;

use cloud_samples::harness::{Harness, SampleRunner};
use cloud_samples::{CloudClient, Config, TRANSFER_SUCCESS_MARKER};

#[tokio::test]
async fn posix_request_against_live_services() {
    let client = Arc::new(CloudClient::new(Config::from_env().unwrap()).unwrap());
    let runner = SampleRunner::for_samples_binary(env!("CARGO_BIN_EXE_cloud-samples"));
    let harness = Harness::new(client.clone(), runner).teardown_on_interrupt(true);

    let (bucket, root) = harness
        .scoped(async {
            let project_id = harness.jobs().project_id()?.to_string();
            let root = harness
                .provisioner()
                .scratch_dir("sts-posix-request-test-src-")
                .await?;
            harness
                .provisioner()
                .write_scratch_file(&root, "text.txt", "test data")
                .await?;
            let bucket = harness.provisioner().generate_bucket().await?;

            let root_arg = root.to_string_lossy().into_owned();
            let output = harness
                .runner()
                .run(
                    "posix-request",
                    &[project_id.as_str(), "", root_arg.as_str(), bucket.name.as_str()],
                )
                .await?;

            let job = harness.jobs().register_from_output(&output).await;
            assert!(job.is_some(), "no transfer job name in output: {}", output);
            assert!(output.contains(TRANSFER_SUCCESS_MARKER));
            if let Some(job) = job {
                let fetched = client.get_transfer_job(&job, &project_id).await?;
                assert_eq!(fetched.name, job);
            }
            Ok::<_, anyhow::Error>((bucket, root))
        })
        .await
        .unwrap();

    assert!(!root.exists());
    let err = client.get_bucket(&bucket.name).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_saved_queries_against_live_services() {
    let runner = SampleRunner::for_samples_binary(env!("CARGO_BIN_EXE_cloud-samples"));
    let output = runner
        .run("list-saved-queries", &[] as &[&str])
        .await
        .unwrap();
    assert!(!output.contains("Error"));
}
