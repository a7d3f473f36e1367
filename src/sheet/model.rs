//! Records built from a parsed worksheet.
//!
//! A worksheet nominally identifies one process type; its header row names
//! the process attributes, sample attributes and file columns, and each data
//! row is one sample reference. Samples carry their per-row process
//! attribute values because those values determine whether rows share a
//! process instance: rows with identical process-attribute values are
//! repeated measurements of the same sample by the same process, while a row
//! with different values creates a new process instance.

use crate::sheet::value::CellValue;

/// A named attribute column, with its value when read from a data row.
/// Header attributes carry no value.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub unit: String,
    pub column: usize,
    pub value: Option<CellValue>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, column: usize) -> Self {
        Attribute {
            name: name.into(),
            unit: unit.into(),
            column,
            value: None,
        }
    }

    pub fn with_value(mut self, value: CellValue) -> Self {
        self.value = Some(value);
        self
    }
}

/// A header column declaring file attachments: cells in this column name
/// files, either as full paths or joined onto `path`.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub description: String,
    pub path: String,
    pub column: usize,
}

impl FileHeader {
    pub fn new(description: impl Into<String>, path: impl Into<String>, column: usize) -> Self {
        FileHeader {
            description: description.into(),
            path: path.into(),
            column,
        }
    }
}

/// One file referenced by a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: String,
    pub column: usize,
}

/// A sample reference as it appears on one data row. The same sample name may
/// appear on many rows across many worksheets; the name is the identity.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    /// Name of the worksheet this sample was previously transformed by;
    /// empty when the sample enters the workflow here.
    pub parent: String,
    /// Source row number in the worksheet.
    pub row: usize,
    /// Sample attribute values from this row.
    pub attributes: Vec<Attribute>,
    /// Process attribute values from this row.
    pub process_attrs: Vec<Attribute>,
    pub files: Vec<FileRef>,
}

impl Sample {
    pub fn new(name: impl Into<String>, row: usize) -> Self {
        Sample {
            name: name.into(),
            parent: String::new(),
            row,
            attributes: Vec::new(),
            process_attrs: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn add_process_attribute(&mut self, attribute: Attribute) {
        self.process_attrs.push(attribute);
    }

    pub fn add_file(&mut self, path: impl Into<String>, column: usize) {
        self.files.push(FileRef {
            path: path.into(),
            column,
        });
    }
}

/// One parsed worksheet.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    /// Ordinal position of the sheet in the load.
    pub index: usize,
    /// Process attribute headers (name and unit only).
    pub process_attrs: Vec<Attribute>,
    /// Sample attribute headers (name and unit only).
    pub sample_attrs: Vec<Attribute>,
    pub file_headers: Vec<FileHeader>,
    pub samples: Vec<Sample>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Worksheet {
            name: name.into(),
            index,
            process_attrs: Vec::new(),
            sample_attrs: Vec::new(),
            file_headers: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn add_process_attr(&mut self, attribute: Attribute) {
        self.process_attrs.push(attribute);
    }

    pub fn add_sample_attr(&mut self, attribute: Attribute) {
        self.sample_attrs.push(attribute);
    }

    pub fn add_file_header(&mut self, header: FileHeader) {
        self.file_headers.push(header);
    }

    pub fn add_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn find_process_attr(&self, column: usize) -> Option<&Attribute> {
        self.process_attrs.iter().find(|a| a.column == column)
    }

    pub fn find_sample_attr(&self, column: usize) -> Option<&Attribute> {
        self.sample_attrs.iter().find(|a| a.column == column)
    }

    pub fn find_file_header(&self, column: usize) -> Option<&FileHeader> {
        self.file_headers.iter().find(|h| h.column == column)
    }
}
