//! Error types for spreadsheet loading and workflow materialization.
//!
//! - [`EtlError`] — Fatal errors that abort an operation.
//! - [`LoadReport`] — Accumulated per-worksheet diagnostics so `check` can
//!   list every problem in one pass.

pub mod report;

pub use report::{Diagnostic, DiagnosticKind, DiagnosticLevel, LoadReport};

use mcflow_client::McError;
use thiserror::Error;

/// Fatal errors raised while loading spreadsheets or talking to the server.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to read workbook '{path}': {message}")]
    Workbook { path: String, message: String },
    #[error("error converting cell in worksheet {worksheet}: row: {row}, column: {column} with value '{value}': {message}")]
    Conversion {
        worksheet: String,
        row: usize,
        column: usize,
        value: String,
        message: String,
    },
    #[error(transparent)]
    Remote(#[from] McError),
}

/// Convenience alias for ETL results.
pub type EtlResult<T> = Result<T, EtlError>;
