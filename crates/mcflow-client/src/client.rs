//! Reqwest-backed implementation of [`McApi`].
//!
//! All operations are JSON POSTs to `{base}/v3/{operation}` with the API key
//! passed as a query parameter. Successful responses arrive wrapped in a
//! `{"data": ...}` envelope.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::{McApi, SampleConnection, SampleMeasurements};
use crate::error::McError;
use crate::models::{Experiment, File, Process, Project, Property, Sample, Setup};

/// Client for a Materials Commons server.
#[derive(Debug, Clone)]
pub struct McClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Join URL segments without doubling or dropping separators.
fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

impl McClient {
    /// Create a client for the given API base url (e.g.
    /// `https://materialscommons.org/api`). The versioned path segment is
    /// appended here so callers configure only the host-level url.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, McError> {
        if base_url.trim().is_empty() {
            return Err(McError::InvalidUrl(base_url.to_string()));
        }
        Ok(McClient {
            base_url: join_url(base_url, "v3"),
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_default(),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<T, McError> {
        let url = join_url(&self.base_url, operation);
        let response = self
            .http
            .post(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(McError::Auth);
        }
        if status >= 300 {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(e) => format!("unable to parse error response: {}", e),
            };
            return Err(McError::Api {
                operation: operation.to_string(),
                status,
                message,
            });
        }

        let envelope: DataEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl McApi for McClient {
    async fn create_experiment(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
        in_progress: bool,
    ) -> Result<Experiment, McError> {
        self.post(
            "createExperimentInProject",
            json!({
                "project_id": project_id,
                "name": name,
                "description": description,
                "in_progress": in_progress,
            }),
        )
        .await
    }

    async fn update_experiment_progress(
        &self,
        project_id: &str,
        experiment_id: &str,
        in_progress: bool,
    ) -> Result<(), McError> {
        #[derive(Deserialize)]
        struct ProgressResult {
            #[serde(default)]
            #[allow(dead_code)]
            success: bool,
        }

        let _: ProgressResult = self
            .post(
                "updateExperimentProgressStatus",
                json!({
                    "project_id": project_id,
                    "experiment_id": experiment_id,
                    "in_progress": in_progress,
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_project(&self, name: &str, description: &str) -> Result<Project, McError> {
        self.post(
            "createProject",
            json!({
                "name": name,
                "description": description,
            }),
        )
        .await
    }

    async fn create_sample(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        attributes: &[Property],
    ) -> Result<Sample, McError> {
        self.post(
            "createSample",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "name": name,
                "attributes": attributes,
            }),
        )
        .await
    }

    async fn create_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        setups: &[Setup],
    ) -> Result<Process, McError> {
        self.post(
            "createProcess",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "name": name,
                "attributes": setups,
            }),
        )
        .await
    }

    async fn add_sample_and_files_to_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        connect: &SampleConnection,
    ) -> Result<Sample, McError> {
        let mut body = json!({
            "project_id": project_id,
            "experiment_id": experiment_id,
            "process_id": connect.process_id,
            "sample_id": connect.sample_id,
            "property_set_id": connect.property_set_id,
            "transform": connect.transform,
            "return_full_sample": false,
        });
        if !connect.files_by_name.is_empty() {
            body["files_by_name"] = serde_json::to_value(&connect.files_by_name)?;
        }
        if !connect.files_by_id.is_empty() {
            body["files_by_id"] = serde_json::to_value(&connect.files_by_id)?;
        }
        self.post("addSampleAndFilesToProcess", body).await
    }

    async fn add_measurements_to_sample_in_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        process_id: &str,
        measurements: &SampleMeasurements,
    ) -> Result<Sample, McError> {
        self.post(
            "addMeasurementsToSampleInProcess",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "process_id": process_id,
                "sample_id": measurements.sample_id,
                "property_set_id": measurements.property_set_id,
                "attributes": measurements.attributes,
                "return_full_sample": false,
            }),
        )
        .await
    }

    async fn get_file_by_path(&self, project_id: &str, path: &str) -> Result<File, McError> {
        self.post(
            "getFileByPathInProject",
            json!({
                "project_id": project_id,
                "path": path,
            }),
        )
        .await
    }
}

impl From<serde_json::Error> for McError {
    fn from(value: serde_json::Error) -> Self {
        McError::Transport(value.to_string())
    }
}
