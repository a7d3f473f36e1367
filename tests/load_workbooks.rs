//! Loader tests against real xlsx workbooks written into a temp dir, plus a
//! full load → build → materialize pass.

use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

use mcflow::error::DiagnosticKind;
use mcflow::materialize::Materializer;
use mcflow::sheet::{CellValue, Loader};
use mcflow::workflow::build_workflow;
use mcflow_client::RecordingClient;

fn write_rows(worksheet: &mut rust_xlsxwriter::Worksheet, rows: &[&[&str]]) {
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write(r as u32, c as u16, *cell).unwrap();
            }
        }
    }
}

fn workbook_with(dir: &TempDir, file: &str, sheets: &[(&str, &[&[&str]])]) -> String {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        write_rows(worksheet, rows);
    }
    let path = dir.path().join(file);
    workbook.save(&path).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn load_parses_headers_and_typed_cells() {
    let dir = TempDir::new().unwrap();
    let path = workbook_with(
        &dir,
        "heat.xlsx",
        &[(
            "Heat",
            &[
                &["Name", "Parent", "p:Time(s)", "p:Temp(c)", "s:Grain(mm)"],
                &["S1", "", "300", "400", "2"],
                &["S3", "", "500", "50", "1.5"],
            ],
        )],
    );

    let outcome = Loader::new(true, 0, vec![path]).load().unwrap();
    assert!(outcome.report.error_or_none().is_none());
    assert_eq!(outcome.worksheets.len(), 1);

    let heat = &outcome.worksheets[0];
    assert_eq!(heat.name, "Heat");
    assert_eq!(heat.process_attrs.len(), 2);
    assert_eq!(heat.sample_attrs.len(), 1);
    assert_eq!(heat.samples.len(), 2);

    let s1 = &heat.samples[0];
    assert_eq!(s1.process_attrs[0].value, Some(CellValue::Int(300)));
    let s3 = &heat.samples[1];
    assert_eq!(s3.attributes[0].value, Some(CellValue::Float(1.5)));
}

#[test]
fn blank_sample_name_row_is_skipped_without_error() {
    let dir = TempDir::new().unwrap();
    let path = workbook_with(
        &dir,
        "heat.xlsx",
        &[(
            "Heat",
            &[
                &["Name", "Parent", "p:Time(s)", "p:Temp(c)", "s:Grain(mm)"],
                &["S1", "", "300", "400", "2"],
                &["", "", "300", "400", "2"],
                &["S3", "", "500", "50", "1"],
            ],
        )],
    );

    let outcome = Loader::new(true, 0, vec![path]).load().unwrap();
    assert!(outcome.report.is_empty());
    let names: Vec<_> = outcome.worksheets[0]
        .samples
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["S1", "S3"]);
}

#[test]
fn unknown_parent_is_reported_but_worksheets_are_returned() {
    let dir = TempDir::new().unwrap();
    let path = workbook_with(
        &dir,
        "heat.xlsx",
        &[(
            "Heat",
            &[
                &["Name", "Parent", "p:Time(s)"],
                &["S1", "NoSuch", "300"],
            ],
        )],
    );

    let outcome = Loader::new(true, 0, vec![path]).load().unwrap();
    assert_eq!(outcome.worksheets.len(), 1);
    let errors: Vec<_> = outcome.report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, DiagnosticKind::ParentUnknown);
    assert!(errors[0].message.contains("NoSuch"));
}

#[test]
fn header_row_offset_skips_leading_rows() {
    let dir = TempDir::new().unwrap();
    let path = workbook_with(
        &dir,
        "heat.xlsx",
        &[(
            "Heat",
            &[
                &["Heat treatment runs, spring batch"],
                &["prepared by M. Smith"],
                &["Name", "Parent", "p:Time(s)"],
                &["S1", "", "300"],
            ],
        )],
    );

    let outcome = Loader::new(true, 2, vec![path]).load().unwrap();
    assert!(outcome.report.is_empty());
    let heat = &outcome.worksheets[0];
    assert_eq!(heat.process_attrs.len(), 1);
    assert_eq!(heat.samples.len(), 1);
    assert_eq!(heat.samples[0].name, "S1");
    assert_eq!(heat.samples[0].row, 4);
}

#[test]
fn worksheets_accumulate_across_workbooks() {
    let dir = TempDir::new().unwrap();
    let heat = workbook_with(
        &dir,
        "heat.xlsx",
        &[("Heat", &[&["Name", "Parent", "p:Temp(c)"], &["S1", "", "400"]])],
    );
    let sem = workbook_with(
        &dir,
        "sem.xlsx",
        &[("SEM", &[&["Name", "Parent", "p:Mag"], &["S1", "Heat", "100"]])],
    );

    let outcome = Loader::new(true, 0, vec![heat, sem]).load().unwrap();
    assert!(outcome.report.error_or_none().is_none());
    assert_eq!(outcome.worksheets.len(), 2);
    assert_eq!(outcome.worksheets[0].index, 1);
    assert_eq!(outcome.worksheets[1].index, 2);
}

#[test]
fn unreadable_workbook_is_a_diagnostic_not_a_panic() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.xlsx").to_string_lossy().into_owned();

    let outcome = Loader::new(true, 0, vec![missing]).load().unwrap();
    assert!(outcome.worksheets.is_empty());
    assert_eq!(outcome.report.errors().count(), 1);
}

#[tokio::test]
async fn loaded_workbook_materializes_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = workbook_with(
        &dir,
        "experiment.xlsx",
        &[
            (
                "Heat",
                &[
                    &["Name", "Parent", "p:Temp(c)", "s:Grain(mm)"],
                    &["S1", "", "400", "2"],
                ],
            ),
            (
                "SEM",
                &[
                    &["Name", "Parent", "p:Mag", "s:GrainSEM(mm)"],
                    &["S1", "Heat", "100", "1.8"],
                ],
            ),
        ],
    );

    let outcome = Loader::new(true, 0, vec![path]).load().unwrap();
    assert!(outcome.report.error_or_none().is_none());

    let workflow = build_workflow(&outcome.worksheets, true);
    assert_eq!(workflow.roots.len(), 1);
    assert_eq!(workflow.instance_count(), 2);

    let client = RecordingClient::new();
    let mut materializer = Materializer::new(&client, "proj-1", "Spring batch", "", "");
    let summary = materializer.run(&workflow).await.unwrap();

    assert_eq!(summary.call_counts["createSample"], 1);
    assert_eq!(summary.call_counts["createProcess"], 2);
    assert_eq!(summary.call_counts["addSampleAndFilesToProcess"], 2);
    assert_eq!(summary.call_counts["addMeasurementsToSampleInProcess"], 2);
}
