//! Workbook loading.
//!
//! Each sheet in each workbook becomes one [`Worksheet`]; a sheet that fails
//! to parse does not abort the others. All per-worksheet and per-row
//! problems are accumulated into a [`LoadReport`] returned alongside the
//! successfully parsed set, so `check` can list everything in one pass.

use std::collections::{BTreeSet, HashSet};

use calamine::{open_workbook_auto, Data, Reader};
use mcflow_client::McApi;
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind, EtlResult, LoadReport};
use crate::sheet::keywords;
use crate::sheet::model::Worksheet;
use crate::sheet::row_processor::RowProcessor;

/// The worksheets a load produced plus everything that went wrong.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub worksheets: Vec<Worksheet>,
    pub report: LoadReport,
}

/// Opens the given workbooks and drives a [`RowProcessor`] per sheet.
pub struct Loader {
    paths: Vec<String>,
    header_row_offset: usize,
    has_parent: bool,
}

impl Loader {
    pub fn new(has_parent: bool, header_row_offset: usize, paths: Vec<String>) -> Self {
        Loader {
            paths,
            header_row_offset,
            has_parent,
        }
    }

    /// Load every sheet of every workbook.
    ///
    /// Fails fast only when the keyword registry is invalid; all other
    /// problems land in the returned report. Freezes the process-wide
    /// keyword registry.
    pub fn load(&self) -> EtlResult<LoadOutcome> {
        keywords::validate_keywords()?;
        keywords::freeze_keywords();
        let registry = keywords::keywords_snapshot();

        let mut outcome = LoadOutcome::default();
        let mut index = 0;

        for path in &self.paths {
            let mut workbook = match open_workbook_auto(path) {
                Ok(workbook) => workbook,
                Err(e) => {
                    outcome.report.push(Diagnostic::error(
                        DiagnosticKind::Parse,
                        format!("failed to read workbook '{}': {}", path, e),
                    ));
                    continue;
                }
            };

            for sheet_name in workbook.sheet_names().to_vec() {
                index += 1;
                let range = match workbook.worksheet_range(&sheet_name) {
                    Ok(range) => range,
                    Err(e) => {
                        outcome.report.push(
                            Diagnostic::error(DiagnosticKind::Parse, e.to_string())
                                .in_worksheet(&sheet_name),
                        );
                        continue;
                    }
                };

                let mut rows = range.rows().skip(self.header_row_offset);
                let Some(header) = rows.next() else {
                    debug!(worksheet = %sheet_name, "sheet has no header row, skipping");
                    continue;
                };

                let mut processor =
                    RowProcessor::new(&sheet_name, self.has_parent, index, registry.clone());
                processor.process_header_row(&cells_of(header));

                let mut row_number = self.header_row_offset + 1;
                let mut failed = false;
                for row in rows {
                    row_number += 1;
                    if let Err(e) = processor.process_sample_row(&cells_of(row), row_number) {
                        outcome.report.push(
                            Diagnostic::error(DiagnosticKind::Parse, e.to_string())
                                .in_worksheet(&sheet_name)
                                .at_row(row_number),
                        );
                        failed = true;
                        break;
                    }
                }
                if !failed {
                    outcome.worksheets.push(processor.into_worksheet());
                }
            }
        }

        outcome.report.extend(validate_unique_names(&outcome.worksheets));
        if self.has_parent {
            outcome.report.extend(validate_parents(&outcome.worksheets));
        }

        Ok(outcome)
    }
}

fn cells_of(row: &[Data]) -> Vec<String> {
    row.iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(v) => v.to_string(),
            Data::Int(v) => v.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) => dt.as_f64().to_string(),
            Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
            Data::Error(_) => String::new(),
        })
        .collect()
}

/// Worksheet names must be unique across a load.
fn validate_unique_names(worksheets: &[Worksheet]) -> LoadReport {
    let mut report = LoadReport::new();
    let mut seen = HashSet::new();
    for worksheet in worksheets {
        if !seen.insert(worksheet.name.as_str()) {
            report.push(Diagnostic::error(
                DiagnosticKind::DuplicateWorksheet,
                format!("worksheet name '{}' appears more than once", worksheet.name),
            ));
        }
    }
    report
}

/// Every non-empty parent must name an existing worksheet that is not the
/// sample's own. Violations accumulate, they do not short-circuit.
fn validate_parents(worksheets: &[Worksheet]) -> LoadReport {
    let known: HashSet<&str> = worksheets.iter().map(|w| w.name.as_str()).collect();
    let mut report = LoadReport::new();

    for worksheet in worksheets {
        for sample in &worksheet.samples {
            if sample.parent.is_empty() {
                continue;
            }
            if sample.parent == worksheet.name {
                report.push(
                    Diagnostic::error(
                        DiagnosticKind::ParentSelfReference,
                        format!(
                            "worksheet '{}' has sample '{}' whose parent is the current worksheet",
                            worksheet.name, sample.name
                        ),
                    )
                    .in_worksheet(&worksheet.name)
                    .at_row(sample.row),
                );
            } else if !known.contains(sample.parent.as_str()) {
                report.push(
                    Diagnostic::error(
                        DiagnosticKind::ParentUnknown,
                        format!(
                            "sample '{}' in worksheet '{}' has parent '{}' that does not exist",
                            sample.name, worksheet.name, sample.parent
                        ),
                    )
                    .in_worksheet(&worksheet.name)
                    .at_row(sample.row),
                );
            }
        }
    }

    report
}

/// Check that every file referenced by a sample exists in the remote
/// project. Missing paths are reported as warnings.
pub async fn validate_files_exist(
    worksheets: &[Worksheet],
    project_id: &str,
    client: &dyn McApi,
) -> LoadReport {
    let paths: BTreeSet<&str> = worksheets
        .iter()
        .flat_map(|w| w.samples.iter())
        .flat_map(|s| s.files.iter())
        .map(|f| f.path.as_str())
        .collect();

    let mut report = LoadReport::new();
    for path in paths {
        if client.get_file_by_path(project_id, path).await.is_err() {
            report.push(Diagnostic::warning(
                DiagnosticKind::MissingFileInProject,
                format!("file '{}' not found in project", path),
            ));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::model::Sample;
    use mcflow_client::RecordingClient;

    fn worksheet_with_sample(name: &str, sample_name: &str, parent: &str) -> Worksheet {
        let mut worksheet = Worksheet::new(name, 1);
        let mut sample = Sample::new(sample_name, 2);
        sample.parent = parent.to_string();
        worksheet.add_sample(sample);
        worksheet
    }

    #[test]
    fn test_validate_parents_ok() {
        let worksheets = vec![
            worksheet_with_sample("Heat", "S1", ""),
            worksheet_with_sample("SEM", "S1", "Heat"),
        ];
        assert!(validate_parents(&worksheets).is_empty());
    }

    #[test]
    fn test_validate_parents_self_reference() {
        let worksheets = vec![worksheet_with_sample("Heat", "S1", "Heat")];
        let report = validate_parents(&worksheets);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(
            report.diagnostics()[0].kind,
            DiagnosticKind::ParentSelfReference
        );
    }

    #[test]
    fn test_validate_parents_unknown() {
        let worksheets = vec![worksheet_with_sample("Heat", "S1", "NoSuch")];
        let report = validate_parents(&worksheets);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.diagnostics()[0].kind, DiagnosticKind::ParentUnknown);
        assert!(report.diagnostics()[0].message.contains("NoSuch"));
    }

    #[test]
    fn test_validate_parents_accumulates() {
        let worksheets = vec![
            worksheet_with_sample("Heat", "S1", "Heat"),
            worksheet_with_sample("SEM", "S2", "Gone"),
        ];
        assert_eq!(validate_parents(&worksheets).errors().count(), 2);
    }

    #[test]
    fn test_validate_unique_names() {
        let worksheets = vec![
            worksheet_with_sample("Heat", "S1", ""),
            worksheet_with_sample("Heat", "S2", ""),
        ];
        let report = validate_unique_names(&worksheets);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(
            report.diagnostics()[0].kind,
            DiagnosticKind::DuplicateWorksheet
        );
    }

    #[tokio::test]
    async fn test_validate_files_exist_reports_missing_as_warnings() {
        let mut worksheet = worksheet_with_sample("Heat", "S1", "");
        worksheet.samples[0].add_file("data/run1.tif", 4);
        worksheet.samples[0].add_file("data/gone.tif", 5);

        let client = RecordingClient::new();
        client.mark_path_missing("data/gone.tif");

        let report = validate_files_exist(&[worksheet], "proj-1", &client).await;
        assert_eq!(report.warnings().count(), 1);
        assert!(!report.has_errors());
        assert!(report.diagnostics()[0].message.contains("data/gone.tif"));
    }

    #[test]
    fn test_cells_of_renders_typed_cells() {
        let row = vec![
            Data::String("S1".into()),
            Data::Float(300.0),
            Data::Bool(true),
            Data::Empty,
        ];
        assert_eq!(cells_of(&row), vec!["S1", "300", "true", ""]);
    }
}
