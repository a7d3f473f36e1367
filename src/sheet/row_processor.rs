//! Per-worksheet row parsing.
//!
//! The header row maps each column to a kind via its keyword prefix; data
//! rows then read attribute values, parent references and file names by
//! looking the column kind back up. Column 1 is always the sample name and
//! column 2 is the parent worksheet when parent handling is on.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::error::{EtlError, EtlResult};
use crate::sheet::keywords::{is_blank_equivalent, ColumnKind, KeywordRegistry};
use crate::sheet::model::{Attribute, FileHeader, Sample, Worksheet};
use crate::sheet::value;

/// Parses one worksheet's header and data rows into a [`Worksheet`].
pub struct RowProcessor {
    worksheet: Worksheet,
    has_parent: bool,
    column_kinds: HashMap<usize, ColumnKind>,
    keywords: KeywordRegistry,
}

impl RowProcessor {
    pub fn new(
        worksheet_name: &str,
        has_parent: bool,
        index: usize,
        keywords: KeywordRegistry,
    ) -> Self {
        RowProcessor {
            worksheet: Worksheet::new(worksheet_name, index),
            has_parent,
            column_kinds: HashMap::new(),
            keywords,
        }
    }

    /// Classify every header cell and record the attribute and file headers.
    ///
    /// Unknown and ignored columns are recorded too, so data rows skip them
    /// deterministically.
    pub fn process_header_row(&mut self, cells: &[String]) {
        for (i, cell) in cells.iter().enumerate() {
            let column = i + 1;
            let cell = cell.trim();
            // Column 1 is the sample name; column 2 is the parent worksheet
            // when parent handling is on.
            if column == 1 || (column == 2 && self.has_parent) {
                continue;
            }
            if cell.is_empty() {
                continue;
            }

            match self.keywords.classify(cell) {
                ColumnKind::ProcessAttribute => {
                    let (name, unit) = name_and_unit(cell);
                    self.worksheet
                        .add_process_attr(Attribute::new(name, unit, column));
                    self.column_kinds.insert(column, ColumnKind::ProcessAttribute);
                }
                ColumnKind::SampleAttribute => {
                    let (name, unit) = name_and_unit(cell);
                    self.worksheet
                        .add_sample_attr(Attribute::new(name, unit, column));
                    self.column_kinds.insert(column, ColumnKind::SampleAttribute);
                }
                ColumnKind::File => {
                    self.worksheet.add_file_header(parse_file_header(cell, column));
                    self.column_kinds.insert(column, ColumnKind::File);
                }
                ColumnKind::Ignore => {
                    self.column_kinds.insert(column, ColumnKind::Ignore);
                }
                ColumnKind::Unknown => {
                    warn!(
                        worksheet = %self.worksheet.name,
                        column,
                        value = %cell,
                        "header column has an unknown keyword, skipping it"
                    );
                    self.column_kinds.insert(column, ColumnKind::Unknown);
                }
            }
        }
    }

    /// Read one data row. A blank sample-name cell skips the entire row.
    /// Blank-equivalent attribute cells emit nothing, so empty attributes
    /// never reach the server.
    pub fn process_sample_row(&mut self, cells: &[String], row: usize) -> EtlResult<()> {
        let mut sample: Option<Sample> = None;

        for (i, cell) in cells.iter().enumerate() {
            let column = i + 1;
            let cell = cell.trim();

            if column == 1 {
                if cell.is_empty() {
                    return Ok(());
                }
                sample = Some(Sample::new(cell, row));
                continue;
            }

            let Some(current) = sample.as_mut() else {
                continue;
            };

            if column == 2 && self.has_parent {
                current.parent = cell.to_string();
                continue;
            }

            if is_blank_equivalent(cell) {
                continue;
            }

            match self.column_kinds.get(&column) {
                Some(ColumnKind::SampleAttribute) => {
                    let Some(header) = self.worksheet.find_sample_attr(column) else {
                        continue;
                    };
                    let attr = Attribute::new(&header.name, &header.unit, column)
                        .with_value(self.convert_cell(cell, row, column)?);
                    current.add_attribute(attr);
                }
                Some(ColumnKind::ProcessAttribute) => {
                    let Some(header) = self.worksheet.find_process_attr(column) else {
                        continue;
                    };
                    let attr = Attribute::new(&header.name, &header.unit, column)
                        .with_value(self.convert_cell(cell, row, column)?);
                    current.add_process_attribute(attr);
                }
                Some(ColumnKind::File) => {
                    let path = cell_to_filepath(cell, self.worksheet.find_file_header(column));
                    current.add_file(path, column);
                }
                Some(ColumnKind::Ignore) | Some(ColumnKind::Unknown) | None => {}
            }
        }

        if let Some(sample) = sample {
            self.worksheet.add_sample(sample);
        }
        Ok(())
    }

    fn convert_cell(&self, cell: &str, row: usize, column: usize) -> EtlResult<value::CellValue> {
        value::convert(cell).map_err(|e| EtlError::Conversion {
            worksheet: self.worksheet.name.clone(),
            row,
            column,
            value: cell.to_string(),
            message: e.to_string(),
        })
    }

    pub fn into_worksheet(self) -> Worksheet {
        self.worksheet
    }
}

/// Parse a header cell of the form `<keyword:>name(unit)`.
///
/// The keyword prefix and the unit are both optional; a unit whose closing
/// paren is missing is treated as running to the end of the cell:
///   `temperature(c)` => ("temperature", "c")
///   `quadrant`       => ("quadrant", "")
///   `length(m`       => ("length", "m")
///   `s:length(mm)`   => ("length", "mm")
pub fn name_and_unit(cell: &str) -> (String, String) {
    let mut cell = cell.trim();
    if cell.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(colon) = cell.find(':') {
        cell = cell[colon + 1..].trim();
    }

    let Some(open) = cell.find('(') else {
        return (cell.to_string(), String::new());
    };

    let name = cell[..open].trim().to_string();
    let unit = match cell.find(')') {
        Some(close) if close > open => cell[open + 1..close].trim().to_string(),
        _ => cell[open + 1..].trim().to_string(),
    };
    (name, unit)
}

/// Parse a file header cell of the form `keyword:[description:]path`. The
/// last `:` separates the trailing path; with a single `:` the description
/// is empty.
pub fn parse_file_header(cell: &str, column: usize) -> FileHeader {
    let first = cell.find(':').unwrap_or(0);
    let last = cell.rfind(':').unwrap_or(0);
    if first != last {
        FileHeader::new(&cell[first + 1..last], cell[last + 1..].trim(), column)
    } else {
        FileHeader::new("", cell[first + 1..].trim(), column)
    }
}

/// Resolve a data cell in a file column to a path. A cell containing `/` is
/// already a full path; a bare filename is joined onto the header's base
/// path.
pub fn cell_to_filepath(cell: &str, header: Option<&FileHeader>) -> String {
    if cell.contains('/') {
        return cell.to_string();
    }
    match header {
        Some(header) if !header.path.is_empty() => Path::new(&header.path)
            .join(cell)
            .to_string_lossy()
            .into_owned(),
        _ => cell.to_string(),
    }
}
