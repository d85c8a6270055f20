use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::{ApiError, CloudClient, Service};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Enabled,
    Disabled,
    Deleted,
    /// Also absorbs statuses this crate does not know about.
    #[default]
    #[serde(other)]
    StatusUnspecified,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosixFilesystem {
    pub root_directory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsData {
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent_pool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posix_data_source: Option<PosixFilesystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_data_sink: Option<GcsData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferJob {
    /// Assigned by the service on creation, `transferJobs/...`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub transfer_spec: TransferSpec,
    #[serde(default)]
    pub status: JobStatus,
}

impl TransferJob {
    /// An enabled job copying `root_directory` into `bucket`. An empty pool name means the default pool.
    pub fn posix_to_gcs(
        project_id: &str,
        source_agent_pool_name: &str,
        root_directory: &str,
        bucket: &str,
    ) -> Self {
        let pool = Some(source_agent_pool_name.trim())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string());
        Self {
            name: String::new(),
            project_id: project_id.to_string(),
            description: None,
            transfer_spec: TransferSpec {
                source_agent_pool_name: pool,
                posix_data_source: Some(PosixFilesystem {
                    root_directory: root_directory.to_string(),
                }),
                gcs_data_sink: Some(GcsData {
                    bucket_name: bucket.to_string(),
                    path: None,
                }),
            },
            status: JobStatus::Enabled,
        }
    }
}

impl CloudClient {
    pub async fn create_transfer_job(&self, job: &TransferJob) -> Result<TransferJob, ApiError> {
        let body = serde_json::to_value(job)?;
        let v = self.post(Service::Transfer, "v1/transferJobs", &body).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn get_transfer_job(
        &self,
        job_name: &str,
        project_id: &str,
    ) -> Result<TransferJob, ApiError> {
        let mut url = self.url(Service::Transfer, &format!("v1/{}", job_name))?;
        url.query_pairs_mut().append_pair("projectId", project_id);
        let v = self.execute(reqwest::Method::GET, url, None).await?;
        Ok(serde_json::from_value(v)?)
    }

    /// Starts a run of the job; returns the long-running operation as raw JSON.
    pub async fn run_transfer_job(&self, job_name: &str, project_id: &str) -> Result<Value, ApiError> {
        let body = json!({ "projectId": project_id });
        self.post(Service::Transfer, &format!("v1/{}:run", job_name), &body)
            .await
    }

    /// Transfer jobs are deleted by moving them to status `DELETED`.
    pub async fn delete_transfer_job(&self, job_name: &str, project_id: &str) -> Result<(), ApiError> {
        let body = json!({
            "projectId": project_id,
            "transferJob": { "status": JobStatus::Deleted },
            "updateTransferJobFieldMask": "status",
        });
        self.patch(Service::Transfer, &format!("v1/{}", job_name), &body)
            .await?;
        Ok(())
    }

    /// Email of the service account Storage Transfer uses inside `project_id`.
    pub async fn transfer_service_account(&self, project_id: &str) -> Result<String, ApiError> {
        let v = self
            .get(
                Service::Transfer,
                &format!("v1/googleServiceAccounts/{}", project_id),
            )
            .await?;
        v.get("accountEmail")
            .and_then(|e| e.as_str())
            .map(|e| e.to_string())
            .ok_or_else(|| {
                ApiError::Decode(serde::de::Error::missing_field("accountEmail"))
            })
    }
}
