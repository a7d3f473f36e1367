//! Workflow materialization.
//!
//! Walks the workflow DAG and issues the server calls that realize it:
//! samples for the creation roots, then processes, sample/file attachments
//! and measurements for every unique process instance. Suppliers are always
//! materialized before their consumers because the server cannot attach an
//! input sample that does not exist yet. Each transforming attachment
//! returns the sample with a fresh property-set id, and that updated
//! identity is what flows to downstream nodes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use petgraph::stable_graph::NodeIndex;
use tracing::{info, warn};

use mcflow_client::{
    FileAndDirection, McApi, Measurement, Process, Sample as McSample, SampleConnection,
    SampleMeasurements, SampleProperty, Setup, SetupProperty,
};

use crate::error::EtlResult;
use crate::sheet::model::{Attribute, Sample};
use crate::workflow::{WorkflowGraph, WorkflowNode};

/// What a materialization run did, for reporting.
#[derive(Debug, Clone, Default)]
pub struct MaterializeSummary {
    pub experiment_id: String,
    /// Calls issued, keyed by remote operation name.
    pub call_counts: BTreeMap<String, usize>,
}

/// Drives the remote API in dependency order over one workflow.
pub struct Materializer<'a> {
    client: &'a dyn McApi,
    project_id: String,
    experiment_name: String,
    description: String,
    /// Project base directory prepended to every attached file path.
    base_dir: String,
    experiment_id: String,
    counts: BTreeMap<String, usize>,
    /// Server-side output samples per materialized node.
    outs: HashMap<NodeIndex, Vec<McSample>>,
    /// Server-side process per materialized instance node.
    processes: HashMap<NodeIndex, Process>,
}

impl<'a> Materializer<'a> {
    pub fn new(
        client: &'a dyn McApi,
        project_id: impl Into<String>,
        experiment_name: impl Into<String>,
        description: impl Into<String>,
        base_dir: impl Into<String>,
    ) -> Self {
        Materializer {
            client,
            project_id: project_id.into(),
            experiment_name: experiment_name.into(),
            description: description.into(),
            base_dir: base_dir.into(),
            experiment_id: String::new(),
            counts: BTreeMap::new(),
            outs: HashMap::new(),
            processes: HashMap::new(),
        }
    }

    /// Create the experiment and materialize the whole workflow.
    ///
    /// The experiment is created with its in-progress flag set; the flag is
    /// cleared on the way out whether or not the traversal succeeded. The
    /// first remote error aborts the traversal.
    pub async fn run(&mut self, workflow: &WorkflowGraph) -> EtlResult<MaterializeSummary> {
        info!(name = %self.experiment_name, "creating experiment");
        let experiment = self
            .client
            .create_experiment(
                &self.project_id,
                &self.experiment_name,
                &self.description,
                true,
            )
            .await?;
        self.count("createExperimentInProject");
        self.experiment_id = experiment.id;

        let result = self.traverse(workflow).await;

        match self
            .client
            .update_experiment_progress(&self.project_id, &self.experiment_id, false)
            .await
        {
            Ok(()) => self.count("updateExperimentProgressStatus"),
            Err(e) => warn!(error = %e, "could not clear experiment in-progress flag"),
        }

        result?;
        Ok(MaterializeSummary {
            experiment_id: self.experiment_id.clone(),
            call_counts: self.counts.clone(),
        })
    }

    async fn traverse(&mut self, workflow: &WorkflowGraph) -> EtlResult<()> {
        for &root in &workflow.roots {
            let mut stack = vec![root];
            while let Some(idx) = stack.pop() {
                if self.step(workflow, idx).await? {
                    stack.extend(workflow.children(idx));
                }
            }
        }
        Ok(())
    }

    /// Materialize one node if it is ready.
    ///
    /// Returns true when the node was materialized on this visit, which is
    /// the only time its children are pushed. A node whose parents are not
    /// all done yet is left alone; the last-finishing parent reaches it
    /// again. This guard also keeps diamond joins from being created twice.
    async fn step(&mut self, workflow: &WorkflowGraph, idx: NodeIndex) -> EtlResult<bool> {
        match workflow.node(idx) {
            WorkflowNode::Root { sample } => {
                if self.outs.contains_key(&idx) {
                    return Ok(false);
                }
                info!(sample = %sample.name, "creating sample");
                let created = self
                    .client
                    .create_sample(&self.project_id, &self.experiment_id, &sample.name, &[])
                    .await?;
                self.count("createSample");
                self.outs.insert(idx, vec![created]);
                Ok(true)
            }
            WorkflowNode::Instance {
                worksheet_name,
                members,
                ..
            } => {
                if self.processes.contains_key(&idx) {
                    return Ok(false);
                }
                let parents = workflow.parents(idx);
                if parents.iter().any(|p| !self.outs.contains_key(p)) {
                    return Ok(false);
                }

                info!(worksheet = %worksheet_name, "creating process");
                let process = self
                    .client
                    .create_process(
                        &self.project_id,
                        &self.experiment_id,
                        worksheet_name,
                        &process_setups(members),
                    )
                    .await?;
                self.count("createProcess");

                let mut outputs = Vec::new();
                for parent in parents {
                    for input in self.outs[&parent].clone() {
                        let matching: Vec<&Sample> =
                            members.iter().filter(|m| m.name == input.name).collect();
                        let updated = self.attach_sample(&process, &input, &matching).await?;

                        // every member row is one repeated measurement of
                        // this sample by this process
                        for member in &matching {
                            if !member.attributes.is_empty() {
                                self.add_measurements(&process, &updated, member).await?;
                            }
                        }
                        outputs.push(updated);
                    }
                }
                self.processes.insert(idx, process);
                self.outs.insert(idx, outputs);
                Ok(true)
            }
        }
    }

    /// Attach one input sample (and the matching rows' files) to a process
    /// as a transforming step.
    async fn attach_sample(
        &mut self,
        process: &Process,
        input: &McSample,
        members: &[&Sample],
    ) -> EtlResult<McSample> {
        let mut seen_paths = std::collections::HashSet::new();
        let files_by_name: Vec<FileAndDirection> = members
            .iter()
            .flat_map(|m| m.files.iter())
            .filter(|f| seen_paths.insert(f.path.clone()))
            .map(|f| FileAndDirection {
                file_id: String::new(),
                path: self.project_path(&f.path),
                direction: "in".to_string(),
            })
            .collect();

        let connect = SampleConnection {
            process_id: process.id.clone(),
            sample_id: input.id.clone(),
            property_set_id: input.property_set_id.clone(),
            transform: true,
            files_by_name,
            files_by_id: Vec::new(),
        };

        let updated = self
            .client
            .add_sample_and_files_to_process(&self.project_id, &self.experiment_id, &connect)
            .await?;
        self.count("addSampleAndFilesToProcess");
        Ok(updated)
    }

    async fn add_measurements(
        &mut self,
        process: &Process,
        sample: &McSample,
        member: &Sample,
    ) -> EtlResult<()> {
        let measurements = SampleMeasurements {
            sample_id: sample.id.clone(),
            property_set_id: sample.property_set_id.clone(),
            attributes: merge_measurements(&member.attributes),
        };
        self.client
            .add_measurements_to_sample_in_process(
                &self.project_id,
                &self.experiment_id,
                &process.id,
                &measurements,
            )
            .await?;
        self.count("addMeasurementsToSampleInProcess");
        Ok(())
    }

    fn project_path(&self, path: &str) -> String {
        if self.base_dir.is_empty() {
            return path.to_string();
        }
        Path::new(&self.base_dir)
            .join(path)
            .to_string_lossy()
            .into_owned()
    }

    fn count(&mut self, operation: &str) {
        *self.counts.entry(operation.to_string()).or_insert(0) += 1;
    }
}

/// Build the process setup block from the shared process-attribute set.
/// Attributes without a value are dropped rather than sent empty.
fn process_setups(members: &[Sample]) -> Vec<Setup> {
    let properties = members
        .first()
        .map(|first| {
            first
                .process_attrs
                .iter()
                .filter_map(|attr| {
                    attr.value.as_ref().map(|value| SetupProperty {
                        name: attr.name.clone(),
                        attribute: attr.name.clone(),
                        otype: "object".to_string(),
                        unit: attr.unit.clone(),
                        value: value.envelope(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    vec![Setup {
        name: "Conditions".to_string(),
        attribute: "conditions".to_string(),
        properties,
    }]
}

/// Merge one row's sample attributes into measurement properties. Attributes
/// sharing a name collapse onto one property with a measurement per source
/// attribute; property identity is the name.
pub fn merge_measurements(attributes: &[Attribute]) -> Vec<SampleProperty> {
    let mut properties: Vec<SampleProperty> = Vec::new();
    for attr in attributes {
        let Some(value) = &attr.value else {
            continue;
        };
        let measurement = Measurement {
            otype: "object".to_string(),
            unit: attr.unit.clone(),
            value: value.json_value(),
            is_best_measure: false,
        };
        match properties.iter_mut().find(|p| p.name == attr.name) {
            Some(property) => property.measurements.push(measurement),
            None => properties.push(SampleProperty {
                name: attr.name.clone(),
                id: String::new(),
                measurements: vec![measurement],
                metadata: serde_json::Map::new(),
            }),
        }
    }
    properties
}
