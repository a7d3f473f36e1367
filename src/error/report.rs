//! Accumulated load diagnostics.
//!
//! A spreadsheet load keeps going past the first problem so that every
//! per-row and per-worksheet finding can be reported at once.

use std::fmt;

/// Severity of one load diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// What kind of problem a diagnostic describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A worksheet failed to parse (bad header, cell conversion, workbook IO).
    Parse,
    /// A sample names its own worksheet as parent.
    ParentSelfReference,
    /// A sample names a parent worksheet that does not exist.
    ParentUnknown,
    /// Two worksheets in one load share a name.
    DuplicateWorksheet,
    /// A referenced file is not present in the remote project.
    MissingFileInProject,
}

/// A single load finding with its source position where known.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub message: String,
    pub worksheet: Option<String>,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            kind,
            message: message.into(),
            worksheet: None,
            row: None,
            column: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Warning,
            ..Diagnostic::error(kind, message)
        }
    }

    pub fn in_worksheet(mut self, worksheet: impl Into<String>) -> Self {
        self.worksheet = Some(worksheet.into());
        self
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(worksheet) = &self.worksheet {
            write!(f, "worksheet '{}'", worksheet)?;
            if let Some(row) = self.row {
                write!(f, " row {}", row)?;
            }
            if let Some(column) = self.column {
                write!(f, " column {}", column)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// The multi-error container a load returns alongside its worksheets.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn new() -> Self {
        LoadReport::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: LoadReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Collapse to `None` when no error-level diagnostics were recorded, so
    /// callers can write `if let Some(errs) = report.error_or_none()`.
    pub fn error_or_none(&self) -> Option<&LoadReport> {
        if self.has_errors() {
            Some(self)
        } else {
            None
        }
    }
}
