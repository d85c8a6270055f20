use reqwest::{Method, Url};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiError, CloudClient, Service};

/// Roles the Storage Transfer service account needs on a sink bucket.
pub const TRANSFER_SINK_ROLES: [&str; 3] = [
    "roles/storage.objectViewer",
    "roles/storage.legacyBucketReader",
    "roles/storage.legacyBucketWriter",
];

impl CloudClient {
    fn bucket_url(&self, bucket: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.url(Service::Storage, "storage/v1/b")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(format!("bucket {}", bucket)))?;
            segments.push(bucket);
            segments.extend(tail);
        }
        Ok(url)
    }

    pub async fn create_bucket(&self, name: &str) -> Result<Value, ApiError> {
        let project_id = self.project_id()?;
        let mut url = self.url(Service::Storage, "storage/v1/b")?;
        url.query_pairs_mut().append_pair("project", project_id);
        let body = json!({ "name": name });
        self.execute(Method::POST, url, Some(&body)).await
    }

    pub async fn get_bucket(&self, name: &str) -> Result<Value, ApiError> {
        let url = self.bucket_url(name, &[])?;
        self.execute(Method::GET, url, None).await
    }

    pub async fn delete_bucket(&self, name: &str) -> Result<(), ApiError> {
        let url = self.bucket_url(name, &[])?;
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    pub async fn list_objects(&self, bucket: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.bucket_url(bucket, &["o"])?;
        self.list_all_url(url, "items").await
    }

    pub async fn delete_object(&self, bucket: &str, object: &str) -> Result<(), ApiError> {
        let url = self.bucket_url(bucket, &["o", object])?;
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Deletes every object in the bucket and returns how many were removed.
    pub async fn empty_bucket(&self, bucket: &str) -> Result<usize, ApiError> {
        let objects = self.list_objects(bucket).await?;
        let mut deleted = 0;
        for object in objects {
            let Some(name) = object.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            match self.delete_object(bucket, name).await {
                Ok(()) => deleted += 1,
                // Already gone is as good as deleted
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        debug!(bucket, deleted, "emptied bucket");
        Ok(deleted)
    }

    pub async fn get_bucket_iam_policy(&self, bucket: &str) -> Result<Value, ApiError> {
        let mut url = self.bucket_url(bucket, &["iam"])?;
        url.query_pairs_mut()
            .append_pair("optionsRequestedPolicyVersion", "3");
        self.execute(Method::GET, url, None).await
    }

    pub async fn set_bucket_iam_policy(&self, bucket: &str, policy: &Value) -> Result<Value, ApiError> {
        let url = self.bucket_url(bucket, &["iam"])?;
        self.execute(Method::PUT, url, Some(policy)).await
    }

    /// Adds `member` to each of `roles` on the bucket policy (read-modify-write).
    pub async fn add_bucket_iam_member(
        &self,
        bucket: &str,
        member: &str,
        roles: &[&str],
    ) -> Result<Value, ApiError> {
        let mut policy = self.get_bucket_iam_policy(bucket).await?;
        add_policy_bindings(&mut policy, member, roles);
        self.set_bucket_iam_policy(bucket, &policy).await
    }
}

/// Appends one binding per role, skipping roles that already list the member.
pub fn add_policy_bindings(policy: &mut Value, member: &str, roles: &[&str]) {
    if !policy.is_object() {
        *policy = json!({});
    }
    let bindings = policy
        .as_object_mut()
        .map(|p| p.entry("bindings").or_insert_with(|| json!([])));
    let Some(Value::Array(bindings)) = bindings else {
        return;
    };
    for role in roles {
        let already_bound = bindings.iter().any(|b| {
            b.get("role").and_then(|r| r.as_str()) == Some(role)
                && b.get("members")
                    .and_then(|m| m.as_array())
                    .is_some_and(|m| m.iter().any(|x| x.as_str() == Some(member)))
        });
        if !already_bound {
            bindings.push(json!({ "role": role, "members": [member] }));
        }
    }
}
