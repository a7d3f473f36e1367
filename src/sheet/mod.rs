//! Worksheet ingestion: keyword registry, cell conversion, row parsing and
//! workbook loading.

pub mod keywords;
pub mod loader;
pub mod model;
pub mod row_processor;
pub mod value;

pub use keywords::{ColumnKind, KeywordRegistry};
pub use loader::{validate_files_exist, LoadOutcome, Loader};
pub use model::{Attribute, FileHeader, FileRef, Sample, Worksheet};
pub use row_processor::RowProcessor;
pub use value::{convert, CellValue};
