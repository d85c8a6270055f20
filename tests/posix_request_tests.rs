//! The posix-request sample end to end: provision, run the real binary,
//! register the job and tear everything down, all against a mock server.

mod common;

use cloud_samples::TRANSFER_SUCCESS_MARKER;
use cloud_samples::harness::Harness;
use common::{PROJECT_ID, mock_client, samples_runner};
use httpmock::{
    Method::{DELETE, GET, PATCH, POST, PUT},
    MockServer,
};
use regex::Regex;
use serde_json::json;

#[tokio::test]
async fn posix_request_creates_job_and_teardown_removes_everything() {
    let server = MockServer::start_async().await;

    // Setup
    let create_bucket = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/storage/v1/b")
                .query_param("project", PROJECT_ID);
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/googleServiceAccounts/test-project");
            then.status(200)
                .json_body(json!({"accountEmail": "sts@test.iam.gserviceaccount.com"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(Regex::new(r"^/storage/v1/b/[^/]+/iam$").unwrap());
            then.status(200).json_body(json!({"bindings": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(Regex::new(r"^/storage/v1/b/[^/]+/iam$").unwrap());
            then.status(200).json_body(json!({}));
        })
        .await;

    // Sample
    let create_job = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/transferJobs")
                .json_body_partial(r#"{"projectId": "test-project", "status": "ENABLED"}"#);
            then.status(200).json_body(json!({
                "name": "transferJobs/12345",
                "projectId": "test-project",
                "status": "ENABLED"
            }));
        })
        .await;
    let run_job = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/transferJobs/12345:run");
            then.status(200).json_body(json!({"name": "transferOperations/op-1"}));
        })
        .await;

    // Teardown
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(Regex::new(r"^/storage/v1/b/[^/]+/o$").unwrap());
            then.status(200).json_body(json!({"items": [{"name": "text.txt"}]}));
        })
        .await;
    let delete_object = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path_matches(Regex::new(r"^/storage/v1/b/[^/]+/o/text\.txt$").unwrap());
            then.status(204);
        })
        .await;
    let delete_bucket = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path_matches(Regex::new(r"^/storage/v1/b/[^/]+$").unwrap());
            then.status(204);
        })
        .await;
    let delete_job = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/v1/transferJobs/12345")
                .json_body_partial(r#"{"transferJob": {"status": "DELETED"}}"#);
            then.status(200).json_body(json!({}));
        })
        .await;

    let harness = Harness::new(mock_client(&server), samples_runner(&server));

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
            assert_eq!(job.as_deref(), Some("transferJobs/12345"));
            assert!(output.contains(TRANSFER_SUCCESS_MARKER));
            assert!(output.contains(&bucket.name));
            Ok::<_, anyhow::Error>((bucket, root))
        })
        .await
        .unwrap();

    create_bucket.assert_async().await;
    create_job.assert_async().await;
    run_job.assert_async().await;
    delete_object.assert_async().await;
    delete_bucket.assert_async().await;
    delete_job.assert_async().await;

    assert!(!root.exists());
    assert!(!bucket.name.is_empty());
    assert!(harness.provisioner().buckets().await.is_empty());
    assert!(harness.jobs().registered().await.is_empty());
}

#[tokio::test]
async fn failed_sample_still_tears_down() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/transferJobs");
            then.status(403).body("caller lacks storagetransfer.jobs.create");
        })
        .await;

    let harness = Harness::new(mock_client(&server), samples_runner(&server));
    let mut scratch = None;
    let result = harness
        .scoped(async {
            let root = harness.provisioner().scratch_dir("sts-posix-fail-").await?;
            scratch = Some(root.clone());
            let root_arg = root.to_string_lossy().into_owned();
            let output = harness
                .runner()
                .run("posix-request", &["test-project", "", root_arg.as_str(), "no-bucket"])
                .await?;
            Ok::<_, anyhow::Error>(output)
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("exited with code 1"));
    assert!(!scratch.unwrap().exists());
}
