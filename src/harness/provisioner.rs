use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::CloudClient;
use crate::storage::TRANSFER_SINK_ROLES;
use crate::util::unique_bucket_name;

use super::error::{CleanupError, CleanupTarget, ProvisioningError};

pub const DEFAULT_BUCKET_PREFIX: &str = "cloud-samples-sts-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Creates buckets and local scratch directories for a test and removes them again.
pub struct ResourceProvisioner {
    client: Arc<CloudClient>,
    prefix: String,
    grant_transfer_access: bool,
    buckets: Mutex<Vec<BucketRecord>>,
    scratch: Mutex<Vec<TempDir>>,
}

impl ResourceProvisioner {
    pub fn new(client: Arc<CloudClient>) -> Self {
        Self {
            client,
            prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            grant_transfer_access: true,
            buckets: Mutex::new(Vec::new()),
            scratch: Mutex::new(Vec::new()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Whether new buckets get the Storage Transfer service account bound as a sink writer.
    pub fn with_transfer_access(mut self, grant: bool) -> Self {
        self.grant_transfer_access = grant;
        self
    }

    pub async fn buckets(&self) -> Vec<BucketRecord> {
        self.buckets.lock().await.clone()
    }

    pub async fn scratch_dirs(&self) -> Vec<PathBuf> {
        self.scratch
            .lock()
            .await
            .iter()
            .map(|d| d.path().to_path_buf())
            .collect()
    }

    pub async fn generate_bucket(&self) -> Result<BucketRecord, ProvisioningError> {
        let name = unique_bucket_name(&self.prefix);
        self.client
            .create_bucket(&name)
            .await
            .map_err(|source| ProvisioningError::CreateBucket {
                bucket: name.clone(),
                source,
            })?;

        let record = BucketRecord {
            name: name.clone(),
            created_at: Utc::now(),
        };
        // Track before granting access so a failed grant still gets cleaned up
        self.buckets.lock().await.push(record.clone());
        info!(bucket = %name, "created bucket");

        if self.grant_transfer_access {
            self.bind_transfer_service(&name)
                .await
                .map_err(|source| ProvisioningError::GrantAccess {
                    bucket: name.clone(),
                    source,
                })?;
        }
        Ok(record)
    }

    async fn bind_transfer_service(&self, bucket: &str) -> Result<(), crate::client::ApiError> {
        let project_id = self.client.project_id()?;
        let email = self.client.transfer_service_account(project_id).await?;
        let member = format!("serviceAccount:{}", email);
        self.client
            .add_bucket_iam_member(bucket, &member, &TRANSFER_SINK_ROLES)
            .await?;
        info!(bucket, %member, "granted transfer service access");
        Ok(())
    }

    /// Creates a tracked temporary directory whose name starts with `prefix`.
    pub async fn scratch_dir(&self, prefix: &str) -> Result<PathBuf, ProvisioningError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|source| ProvisioningError::Scratch {
                path: std::env::temp_dir().join(prefix),
                source,
            })?;
        let path = dir.path().to_path_buf();
        self.scratch.lock().await.push(dir);
        Ok(path)
    }

    pub async fn write_scratch_file(
        &self,
        dir: &Path,
        file_name: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf, ProvisioningError> {
        let path = dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| ProvisioningError::Scratch {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Empties and deletes every tracked bucket, continuing past failures.
    pub async fn delete_buckets(&self) -> Result<(), CleanupError> {
        let buckets = std::mem::take(&mut *self.buckets.lock().await);
        let mut errors = CleanupError::default();
        for bucket in buckets {
            match self.delete_bucket(&bucket.name).await {
                Ok(()) => info!(bucket = %bucket.name, "deleted bucket"),
                Err(e) => {
                    warn!(bucket = %bucket.name, error = %e, "failed to delete bucket");
                    errors.push(CleanupTarget::Bucket(bucket.name), e);
                }
            }
        }
        errors.into_result()
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), crate::client::ApiError> {
        let result = match self.client.empty_bucket(name).await {
            Ok(_) => self.client.delete_bucket(name).await,
            Err(e) => Err(e),
        };
        match result {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    pub async fn remove_scratch(&self) -> Result<(), CleanupError> {
        let dirs = std::mem::take(&mut *self.scratch.lock().await);
        let mut errors = CleanupError::default();
        for dir in dirs {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "failed to remove scratch dir");
                errors.push(CleanupTarget::Scratch(path), e);
            }
        }
        errors.into_result()
    }

    /// Buckets first, then scratch directories. A no-op when nothing is tracked.
    pub async fn delete_all(&self) -> Result<(), CleanupError> {
        let mut errors = CleanupError::default();
        if let Err(e) = self.delete_buckets().await {
            errors.merge(e);
        }
        if let Err(e) = self.remove_scratch().await {
            errors.merge(e);
        }
        errors.into_result()
    }
}
