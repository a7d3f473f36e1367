//! Workflow graph construction and representation.
//!
//! The [`WorkflowGraph`] is built from the frozen worksheet set by
//! [`build_workflow`]. Roots are synthetic sample-creation steps; every
//! other node is a unique process instance identified by its content key.

pub mod builder;
pub mod types;

pub use builder::{build_workflow, instance_key};
pub use types::{WorkflowGraph, WorkflowNode};
