use serde_json::Value;

use crate::client::{ApiError, CloudClient, Service};

impl CloudClient {
    /// Fetches a saved query by full name, `projects/<p>/savedQueries/<id>`.
    pub async fn get_saved_query(&self, full_query_name: &str) -> Result<Value, ApiError> {
        let name = full_query_name.trim_matches('/');
        if name.is_empty() {
            return Err(ApiError::InvalidUrl(full_query_name.to_string()));
        }
        self.get(Service::Asset, &format!("v1/{}", name)).await
    }

    /// Lists every saved query under `parent` (`projects/<id>`, `folders/<id>` or `organizations/<id>`).
    pub async fn list_saved_queries(&self, parent: &str) -> Result<Vec<Value>, ApiError> {
        let path = format!("v1/{}/savedQueries", parent.trim_matches('/'));
        self.list_all(Service::Asset, &path, "savedQueries").await
    }

    pub async fn list_project_saved_queries(&self) -> Result<Vec<Value>, ApiError> {
        let parent = format!("projects/{}", self.project_id()?);
        self.list_saved_queries(&parent).await
    }
}
