//! The operation surface the ETL flow consumes.
//!
//! Keeping the concrete HTTP client behind [`McApi`] lets tests substitute
//! [`RecordingClient`](crate::recording::RecordingClient) and assert on the
//! exact call sequence.

use async_trait::async_trait;

use crate::error::McError;
use crate::models::{
    Experiment, File, FileAndDirection, Process, Project, Property, Sample, SampleProperty, Setup,
};

/// Arguments for attaching one input sample (plus its files) to a process.
#[derive(Debug, Clone, Default)]
pub struct SampleConnection {
    pub process_id: String,
    pub sample_id: String,
    pub property_set_id: String,
    /// When true the attachment produces a new property-set identity for the
    /// sample, which is what the returned [`Sample`] carries.
    pub transform: bool,
    pub files_by_name: Vec<FileAndDirection>,
    pub files_by_id: Vec<FileAndDirection>,
}

/// Arguments for recording measurements on a sample within a process.
#[derive(Debug, Clone, Default)]
pub struct SampleMeasurements {
    pub sample_id: String,
    pub property_set_id: String,
    pub attributes: Vec<SampleProperty>,
}

/// The Materials Commons operations used during materialization.
#[async_trait]
pub trait McApi: Send + Sync {
    async fn create_experiment(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
        in_progress: bool,
    ) -> Result<Experiment, McError>;

    async fn update_experiment_progress(
        &self,
        project_id: &str,
        experiment_id: &str,
        in_progress: bool,
    ) -> Result<(), McError>;

    async fn create_project(&self, name: &str, description: &str) -> Result<Project, McError>;

    async fn create_sample(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        attributes: &[Property],
    ) -> Result<Sample, McError>;

    async fn create_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        name: &str,
        setups: &[Setup],
    ) -> Result<Process, McError>;

    /// Attach an input sample and its files to a process, returning the
    /// sample with its post-transform property-set id.
    async fn add_sample_and_files_to_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        connect: &SampleConnection,
    ) -> Result<Sample, McError>;

    async fn add_measurements_to_sample_in_process(
        &self,
        project_id: &str,
        experiment_id: &str,
        process_id: &str,
        measurements: &SampleMeasurements,
    ) -> Result<Sample, McError>;

    async fn get_file_by_path(&self, project_id: &str, path: &str) -> Result<File, McError>;
}
