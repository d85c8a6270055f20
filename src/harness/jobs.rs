use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::{ApiError, CloudClient};
use crate::transfer::TransferJob;
use crate::util::find_transfer_job_name;

use super::error::{CleanupError, CleanupTarget, ProvisioningError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJobRecord {
    pub name: String,
}

/// Tracks transfer jobs created during a test and deletes them at teardown.
pub struct JobLifecycleManager {
    client: Arc<CloudClient>,
    jobs: Mutex<Vec<TransferJobRecord>>,
}

impl JobLifecycleManager {
    pub fn new(client: Arc<CloudClient>) -> Self {
        Self {
            client,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn client(&self) -> &CloudClient {
        &self.client
    }

    pub fn project_id(&self) -> Result<&str, ApiError> {
        self.client.project_id()
    }

    pub async fn registered(&self) -> Vec<TransferJobRecord> {
        self.jobs.lock().await.clone()
    }

    /// Creates the job and registers the returned name for cleanup.
    pub async fn create_job(&self, job: &TransferJob) -> Result<TransferJob, ProvisioningError> {
        let created = self
            .client
            .create_transfer_job(job)
            .await
            .map_err(ProvisioningError::CreateJob)?;
        if !created.name.is_empty() {
            self.register_job_for_cleanup(created.name.clone()).await;
        }
        Ok(created)
    }

    /// Returns `false` when the name was already registered.
    pub async fn register_job_for_cleanup(&self, job_name: impl Into<String>) -> bool {
        let name = job_name.into();
        let mut jobs = self.jobs.lock().await;
        if jobs.iter().any(|j| j.name == name) {
            debug!(job = %name, "transfer job already registered");
            return false;
        }
        info!(job = %name, "registered transfer job for cleanup");
        jobs.push(TransferJobRecord { name });
        true
    }

    /// Registers the first `transferJobs/...` name found in sample output.
    pub async fn register_from_output(&self, output: &str) -> Option<String> {
        let name = find_transfer_job_name(output)?;
        self.register_job_for_cleanup(name.clone()).await;
        Some(name)
    }

    /// Deletes every registered job, continuing past failures.
    pub async fn clean_up(&self) -> Result<(), CleanupError> {
        let jobs = std::mem::take(&mut *self.jobs.lock().await);
        let mut errors = CleanupError::default();
        if jobs.is_empty() {
            return Ok(());
        }
        let project_id = match self.client.project_id() {
            Ok(p) => p,
            Err(e) => {
                for job in jobs {
                    errors.push(
                        CleanupTarget::TransferJob(job.name),
                        ApiError::MissingProject,
                    );
                }
                warn!(error = %e, "cannot clean up transfer jobs without a project id");
                return errors.into_result();
            }
        };
        for job in jobs {
            match self.client.delete_transfer_job(&job.name, project_id).await {
                Ok(()) => info!(job = %job.name, "deleted transfer job"),
                Err(e) if e.is_not_found() => {
                    debug!(job = %job.name, "transfer job already gone");
                }
                Err(e) => {
                    warn!(job = %job.name, error = %e, "failed to delete transfer job");
                    errors.push(CleanupTarget::TransferJob(job.name), e);
                }
            }
        }
        errors.into_result()
    }
}
