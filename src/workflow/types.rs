//! Workflow graph representation.
//!
//! Nodes live in a stable-index arena and edges are supplier → consumer:
//! an edge means the source node's output samples are inputs to the target
//! process. Shared suppliers (one node feeding several consumers) are plain
//! extra edges, so no shared-ownership bookkeeping is needed.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::sheet::model::Sample;

/// A node in the workflow DAG.
///
/// Every distinct sample name gets a synthetic creation root; every unique
/// `(sample, worksheet, process-attribute values)` combination gets an
/// instance node. Rows that collapse onto an existing instance join its
/// member list and contribute measurements rather than a new process.
#[derive(Debug, Clone)]
pub enum WorkflowNode {
    Root {
        /// The first row encountered with this sample name.
        sample: Sample,
    },
    Instance {
        worksheet_name: String,
        worksheet_index: usize,
        sample_name: String,
        /// Content hash identifying this unique process instance.
        key: String,
        /// All rows sharing this instance's process-attribute values.
        members: Vec<Sample>,
    },
}

impl WorkflowNode {
    pub fn is_root(&self) -> bool {
        matches!(self, WorkflowNode::Root { .. })
    }

    /// Label shown when rendering the workflow.
    pub fn label(&self) -> &str {
        match self {
            WorkflowNode::Root { .. } => "Create Sample",
            WorkflowNode::Instance { worksheet_name, .. } => worksheet_name,
        }
    }
}

/// The workflow DAG plus its entry points.
#[derive(Debug, Default)]
pub struct WorkflowGraph {
    pub graph: StableDiGraph<WorkflowNode, ()>,
    /// One creation root per distinct sample name, in first-seen order.
    pub roots: Vec<NodeIndex>,
}

impl WorkflowGraph {
    pub fn node(&self, idx: NodeIndex) -> &WorkflowNode {
        &self.graph[idx]
    }

    /// Suppliers feeding this node.
    pub fn parents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect()
    }

    /// Consumers of this node's outputs.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect()
    }

    /// Number of unique process-instance nodes (roots excluded).
    pub fn instance_count(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&idx| !self.graph[idx].is_root())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_labels() {
        let root = WorkflowNode::Root {
            sample: Sample::new("S1", 2),
        };
        assert!(root.is_root());
        assert_eq!(root.label(), "Create Sample");

        let instance = WorkflowNode::Instance {
            worksheet_name: "Heat".into(),
            worksheet_index: 1,
            sample_name: "S1".into(),
            key: "abc".into(),
            members: vec![],
        };
        assert!(!instance.is_root());
        assert_eq!(instance.label(), "Heat");
    }

    #[test]
    fn test_parents_and_children() {
        let mut wf = WorkflowGraph::default();
        let a = wf.graph.add_node(WorkflowNode::Root {
            sample: Sample::new("S1", 2),
        });
        let b = wf.graph.add_node(WorkflowNode::Instance {
            worksheet_name: "Heat".into(),
            worksheet_index: 1,
            sample_name: "S1".into(),
            key: "k".into(),
            members: vec![],
        });
        wf.graph.add_edge(a, b, ());
        assert_eq!(wf.children(a), vec![b]);
        assert_eq!(wf.parents(b), vec![a]);
        assert!(wf.parents(a).is_empty());
        assert_eq!(wf.instance_count(), 1);
    }
}
