//! An in-memory [`McApi`] implementation that records every call.
//!
//! Materialization tests assert on the recorded operation sequence (ordering
//! of process creation vs. sample attachment) and on per-operation counts,
//! without a server.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::api::{McApi, SampleConnection, SampleMeasurements};
use crate::error::McError;
use crate::models::{Experiment, File, Process, Project, Property, Sample, Setup};

/// One recorded API call: the operation name plus a JSON rendering of the
/// arguments that matter for assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: String,
    pub body: Value,
}

#[derive(Default)]
struct State {
    calls: Vec<RecordedCall>,
    next_id: u64,
    sample_names: HashMap<String, String>,
    fail_on: Option<String>,
    missing_paths: HashSet<String>,
}

/// A fake Materials Commons server handing out synthetic ids.
///
/// Every transforming attachment mints a fresh property-set id, mirroring the
/// real server's identity threading.
#[derive(Default)]
pub struct RecordingClient {
    state: Mutex<State>,
}

impl RecordingClient {
    pub fn new() -> Self {
        RecordingClient::default()
    }

    /// Make the named operation fail with an API error on every call.
    pub fn fail_on(&self, operation: &str) {
        self.state.lock().fail_on = Some(operation.to_string());
    }

    /// Make `get_file_by_path` report the given path as unknown.
    pub fn mark_path_missing(&self, path: &str) {
        self.state.lock().missing_paths.insert(path.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// The operation names in call order.
    pub fn operations(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|c| c.operation.clone())
            .collect()
    }

    pub fn count_of(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

impl State {
    fn record(&mut self, operation: &str, body: Value) -> Result<(), McError> {
        if self.fail_on.as_deref() == Some(operation) {
            return Err(McError::Api {
                operation: operation.to_string(),
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        self.calls.push(RecordedCall {
            operation: operation.to_string(),
            body,
        });
        Ok(())
    }

    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[async_trait]
impl McApi for RecordingClient {
    async fn create_experiment(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
        in_progress: bool,
    ) -> Result<Experiment, McError> {
        let mut state = self.state.lock();
        state.record(
            "createExperimentInProject",
            json!({
                "project_id": project_id,
                "name": name,
                "description": description,
                "in_progress": in_progress,
            }),
        )?;
        Ok(Experiment {
            id: state.next("exp"),
            name: name.to_string(),
            ..Experiment::default()
        })
    }

    async fn update_experiment_progress(
        &self,
        project_id: &str,
        experiment_id: &str,
        in_progress: bool,
    ) -> Result<(), McError> {
        self.state.lock().record(
            "updateExperimentProgressStatus",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "in_progress": in_progress,
            }),
        )
    }

    async fn create_project(&self, name: &str, description: &str) -> Result<Project, McError> {
        let mut state = self.state.lock();
        state.record(
            "createProject",
            json!({ "name": name, "description": description }),
        )?;
        Ok(Project {
            id: state.next("proj"),
            name: name.to_string(),
            ..Project::default()
        })
    }

    async fn create_sample(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        attributes: &[Property],
    ) -> Result<Sample, McError> {
        let mut state = self.state.lock();
        state.record(
            "createSample",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "name": name,
                "attributes": attributes,
            }),
        )?;
        let id = state.next("sample");
        let property_set_id = state.next("pset");
        state.sample_names.insert(id.clone(), name.to_string());
        Ok(Sample {
            id,
            name: name.to_string(),
            property_set_id,
            ..Sample::default()
        })
    }

    async fn create_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        setups: &[Setup],
    ) -> Result<Process, McError> {
        let mut state = self.state.lock();
        state.record(
            "createProcess",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "name": name,
                "attributes": setups,
            }),
        )?;
        Ok(Process {
            id: state.next("proc"),
            name: name.to_string(),
            ..Process::default()
        })
    }

    async fn add_sample_and_files_to_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        connect: &SampleConnection,
    ) -> Result<Sample, McError> {
        let mut state = self.state.lock();
        state.record(
            "addSampleAndFilesToProcess",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "process_id": connect.process_id,
                "sample_id": connect.sample_id,
                "property_set_id": connect.property_set_id,
                "transform": connect.transform,
                "files_by_name": serde_json::to_value(&connect.files_by_name).unwrap_or(Value::Null),
            }),
        )?;
        let name = state
            .sample_names
            .get(&connect.sample_id)
            .cloned()
            .unwrap_or_default();
        let property_set_id = state.next("pset");
        Ok(Sample {
            id: connect.sample_id.clone(),
            name,
            property_set_id,
            ..Sample::default()
        })
    }

    async fn add_measurements_to_sample_in_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        process_id: &str,
        measurements: &SampleMeasurements,
    ) -> Result<Sample, McError> {
        let mut state = self.state.lock();
        state.record(
            "addMeasurementsToSampleInProcess",
            json!({
                "project_id": project_id,
                "experiment_id": experiment_id,
                "process_id": process_id,
                "sample_id": measurements.sample_id,
                "property_set_id": measurements.property_set_id,
                "attributes": serde_json::to_value(&measurements.attributes).unwrap_or(Value::Null),
            }),
        )?;
        let name = state
            .sample_names
            .get(&measurements.sample_id)
            .cloned()
            .unwrap_or_default();
        Ok(Sample {
            id: measurements.sample_id.clone(),
            name,
            property_set_id: measurements.property_set_id.clone(),
            ..Sample::default()
        })
    }

    async fn get_file_by_path(&self, project_id: &str, path: &str) -> Result<File, McError> {
        let mut state = self.state.lock();
        if state.missing_paths.contains(path) {
            return Err(McError::Api {
                operation: "getFileByPathInProject".to_string(),
                status: 404,
                message: format!("no such file: {}", path),
            });
        }
        state.record(
            "getFileByPathInProject",
            json!({ "project_id": project_id, "path": path }),
        )?;
        Ok(File {
            id: state.next("file"),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let client = RecordingClient::new();
        client
            .create_experiment("proj", "Exp", "desc", true)
            .await
            .unwrap();
        client
            .create_sample("proj", "exp-1", "S1", &[])
            .await
            .unwrap();
        assert_eq!(
            client.operations(),
            vec!["createExperimentInProject", "createSample"]
        );
    }

    #[tokio::test]
    async fn test_transform_mints_new_property_set() {
        let client = RecordingClient::new();
        let sample = client
            .create_sample("proj", "exp-1", "S1", &[])
            .await
            .unwrap();
        let process = client
            .create_process("proj", "exp-1", "Heat", &[])
            .await
            .unwrap();
        let connect = SampleConnection {
            process_id: process.id,
            sample_id: sample.id.clone(),
            property_set_id: sample.property_set_id.clone(),
            transform: true,
            ..SampleConnection::default()
        };
        let updated = client
            .add_sample_and_files_to_process("proj", "exp-1", &connect)
            .await
            .unwrap();
        assert_eq!(updated.id, sample.id);
        assert_eq!(updated.name, "S1");
        assert_ne!(updated.property_set_id, sample.property_set_id);
    }

    #[tokio::test]
    async fn test_fail_on_injects_error() {
        let client = RecordingClient::new();
        client.fail_on("createProcess");
        let err = client
            .create_process("proj", "exp-1", "Heat", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, McError::Api { status: 500, .. }));
        assert_eq!(client.count_of("createProcess"), 0);
    }

    #[tokio::test]
    async fn test_missing_path_reported() {
        let client = RecordingClient::new();
        client.mark_path_missing("data/gone.tif");
        assert!(client.get_file_by_path("proj", "data/gone.tif").await.is_err());
        assert!(client.get_file_by_path("proj", "data/here.tif").await.is_ok());
    }
}
