pub mod config;
pub mod display;
pub mod error;
pub mod materialize;
pub mod sheet;
pub mod workflow;

pub use crate::error::{
    Diagnostic, DiagnosticKind, DiagnosticLevel, EtlError, EtlResult, LoadReport,
};
pub use crate::materialize::{MaterializeSummary, Materializer};
pub use crate::sheet::{
    validate_files_exist, Attribute, CellValue, ColumnKind, FileHeader, FileRef, KeywordRegistry,
    LoadOutcome, Loader, RowProcessor, Sample, Worksheet,
};
pub use crate::workflow::{build_workflow, instance_key, WorkflowGraph, WorkflowNode};
