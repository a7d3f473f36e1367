//! Workflow construction.
//!
//! Turns the parsed worksheets into a workflow DAG in three passes:
//!
//! 1. Scan every row for distinct sample names and create one synthetic
//!    "create sample" root per name.
//! 2. Collapse rows onto unique process instances. A worksheet produces one
//!    process per distinct set of process-attribute values; rows repeating a
//!    combination join the existing instance as extra members.
//! 3. Wire the instances together. A row with an empty parent is fed by its
//!    sample's creation root; a row naming a parent worksheet is fed by the
//!    instance that transformed the same sample there.

use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::sheet::model::{Sample, Worksheet};
use crate::workflow::types::{WorkflowGraph, WorkflowNode};

/// The content-addressed identity of a unique process instance.
///
/// Hashes the sample name, the worksheet name and every process-attribute
/// `(unit, value)` pair. Without parent handling the sample attributes are
/// included as well, since then they are all that distinguishes rows.
pub fn instance_key(sample: &Sample, worksheet_name: &str, has_parent: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sample.name.as_bytes());
    hasher.update(worksheet_name.as_bytes());
    for attr in &sample.process_attrs {
        hasher.update(attr.unit.as_bytes());
        if let Some(value) = &attr.value {
            hasher.update(value.envelope().to_string().as_bytes());
        }
    }
    if !has_parent {
        for attr in &sample.attributes {
            hasher.update(attr.unit.as_bytes());
            if let Some(value) = &attr.value {
                hasher.update(value.envelope().to_string().as_bytes());
            }
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Build the workflow DAG for a frozen set of worksheets.
pub fn build_workflow(worksheets: &[Worksheet], has_parent: bool) -> WorkflowGraph {
    let mut wf = WorkflowGraph::default();

    // Pass 1: one creation root per distinct sample name.
    let mut root_by_sample: HashMap<String, NodeIndex> = HashMap::new();
    for worksheet in worksheets {
        for sample in &worksheet.samples {
            if !root_by_sample.contains_key(&sample.name) {
                let idx = wf.graph.add_node(WorkflowNode::Root {
                    sample: sample.clone(),
                });
                root_by_sample.insert(sample.name.clone(), idx);
                wf.roots.push(idx);
            }
        }
    }

    // Pass 2: unique process instances keyed by content hash.
    let mut instances: HashMap<String, NodeIndex> = HashMap::new();
    for worksheet in worksheets {
        for sample in &worksheet.samples {
            let key = instance_key(sample, &worksheet.name, has_parent);
            match instances.get(&key) {
                Some(&idx) => {
                    if let WorkflowNode::Instance { members, .. } = &mut wf.graph[idx] {
                        members.push(sample.clone());
                    }
                }
                None => {
                    let idx = wf.graph.add_node(WorkflowNode::Instance {
                        worksheet_name: worksheet.name.clone(),
                        worksheet_index: worksheet.index,
                        sample_name: sample.name.clone(),
                        key: key.clone(),
                        members: vec![sample.clone()],
                    });
                    instances.insert(key, idx);
                }
            }
        }
    }

    // Pass 3: wire suppliers to consumers. update_edge keeps the edge set
    // deduplicated.
    for worksheet in worksheets {
        for sample in &worksheet.samples {
            let key = instance_key(sample, &worksheet.name, has_parent);
            let Some(&target) = instances.get(&key) else {
                warn!(
                    worksheet = %worksheet.name,
                    sample = %sample.name,
                    "no matching process instance to wire up"
                );
                continue;
            };

            let supplier = if sample.parent.is_empty() {
                root_by_sample.get(&sample.name).copied()
            } else {
                find_parent_instance(&sample.name, &sample.parent, worksheets, &instances, has_parent)
            };

            match supplier {
                Some(source) => {
                    wf.graph.update_edge(source, target, ());
                }
                None => warn!(
                    worksheet = %worksheet.name,
                    sample = %sample.name,
                    parent = %sample.parent,
                    "no matching supplier to wire up"
                ),
            }
        }
    }

    wf
}

/// Find the instance that transformed `sample_name` in the parent worksheet
/// by recomputing that row's key.
fn find_parent_instance(
    sample_name: &str,
    parent_worksheet: &str,
    worksheets: &[Worksheet],
    instances: &HashMap<String, NodeIndex>,
    has_parent: bool,
) -> Option<NodeIndex> {
    let worksheet = worksheets.iter().find(|w| w.name == parent_worksheet)?;
    let sample = worksheet.samples.iter().find(|s| s.name == sample_name)?;
    instances
        .get(&instance_key(sample, parent_worksheet, has_parent))
        .copied()
}
