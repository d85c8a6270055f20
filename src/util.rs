use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

/// Printed by `posix-request` once the job has been created and started.
pub const TRANSFER_SUCCESS_MARKER: &str = "Created and ran a transfer job";

const MAX_BUCKET_NAME_LEN: usize = 63;

const JOB_NAME_PREFIX: &str = "transferJobs/";

static TRANSFER_JOB_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"transferJobs/[A-Za-z0-9_\-.]+").expect("valid transfer job pattern")
});

/// First `transferJobs/...` token in `output` with a non-empty id, if any.
pub fn find_transfer_job_name(output: &str) -> Option<String> {
    TRANSFER_JOB_NAME
        .find_iter(output)
        .map(|m| m.as_str().trim_end_matches('.'))
        .find(|name| name.len() > JOB_NAME_PREFIX.len())
        .map(str::to_string)
}

/// `prefix` followed by a random v4 UUID, lowercased.
///
/// The prefix keeps only ASCII characters and is shortened so the full UUID
/// always fits within the bucket name limit.
pub fn unique_bucket_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let prefix: String = prefix
        .chars()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_BUCKET_NAME_LEN - id.len())
        .collect();
    format!("{}{}", prefix, id)
}
