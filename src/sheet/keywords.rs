//! Keyword classification of header columns.
//!
//! A keyword is a `prefix:` on a header cell identifying what kind of column
//! it is, e.g. `p:Temperature(c)` marks a process attribute and
//! `file:Measurements:data/` a file column. The registry holds the three
//! prefix sets and is process-wide configuration: it may be adjusted at
//! startup, and is frozen once the first load begins.

use std::collections::HashSet;
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::error::{EtlError, EtlResult};

/// What a classified header column produces on data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    SampleAttribute,
    ProcessAttribute,
    File,
    /// Explicit `ignore:` keyword; the column produces no output.
    Ignore,
    /// A keyword prefix not present in any set; the column is skipped.
    Unknown,
}

/// Cells treated as "no value here" on data rows.
const BLANK_EQUIVALENTS: &[&str] = &["", "n/a", "blank"];

/// Returns true for cells that stand for an absent value.
pub fn is_blank_equivalent(cell: &str) -> bool {
    let cell = cell.trim().to_lowercase();
    BLANK_EQUIVALENTS.contains(&cell.as_str())
}

/// The three keyword prefix sets used to classify header columns.
#[derive(Debug, Clone)]
pub struct KeywordRegistry {
    sample: HashSet<String>,
    process: HashSet<String>,
    file: HashSet<String>,
    frozen: bool,
}

impl Default for KeywordRegistry {
    fn default() -> Self {
        KeywordRegistry {
            sample: ["s", "sample", "sample attribute"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            process: ["p", "process"].iter().map(|s| s.to_string()).collect(),
            file: ["f", "file", "files"].iter().map(|s| s.to_string()).collect(),
            frozen: false,
        }
    }
}

impl KeywordRegistry {
    fn ensure_mutable(&self) -> EtlResult<()> {
        if self.frozen {
            return Err(EtlError::Config(
                "keywords cannot be changed after a load has started".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_sample_keyword(&mut self, keyword: &str) -> EtlResult<()> {
        self.ensure_mutable()?;
        self.sample.insert(keyword.to_lowercase());
        Ok(())
    }

    pub fn add_process_keyword(&mut self, keyword: &str) -> EtlResult<()> {
        self.ensure_mutable()?;
        self.process.insert(keyword.to_lowercase());
        Ok(())
    }

    pub fn add_file_keyword(&mut self, keyword: &str) -> EtlResult<()> {
        self.ensure_mutable()?;
        self.file.insert(keyword.to_lowercase());
        Ok(())
    }

    pub fn set_sample_keywords<I, S>(&mut self, keywords: I) -> EtlResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_mutable()?;
        self.sample = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        Ok(())
    }

    pub fn set_process_keywords<I, S>(&mut self, keywords: I) -> EtlResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_mutable()?;
        self.process = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        Ok(())
    }

    pub fn set_file_keywords<I, S>(&mut self, keywords: I) -> EtlResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_mutable()?;
        self.file = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        Ok(())
    }

    /// Freeze the registry; later mutation attempts fail with a config error.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Fails if any set is empty or any prefix appears in more than one set.
    pub fn validate(&self) -> EtlResult<()> {
        if self.process.is_empty() {
            return Err(EtlError::Config(
                "there must be at least 1 process keyword".to_string(),
            ));
        }
        if self.sample.is_empty() {
            return Err(EtlError::Config(
                "there must be at least 1 sample keyword".to_string(),
            ));
        }
        if self.file.is_empty() {
            return Err(EtlError::Config(
                "there must be at least 1 file keyword".to_string(),
            ));
        }
        let overlapping = self.overlapping_keywords();
        if !overlapping.is_empty() {
            return Err(EtlError::Config(format!(
                "overlapping keywords: {}",
                overlapping.join(", ")
            )));
        }
        Ok(())
    }

    fn overlapping_keywords(&self) -> Vec<String> {
        let mut overlapping: Vec<String> = self
            .sample
            .iter()
            .chain(self.process.iter())
            .chain(self.file.iter())
            .filter(|k| {
                let count = [&self.sample, &self.process, &self.file]
                    .iter()
                    .filter(|set| set.contains(k.as_str()))
                    .count();
                count > 1
            })
            .cloned()
            .collect();
        overlapping.sort();
        overlapping.dedup();
        overlapping
    }

    /// Classify a trimmed header cell by its keyword prefix.
    ///
    /// A cell with no `:` has no keyword and defaults to a sample-attribute
    /// column.
    pub fn classify(&self, cell: &str) -> ColumnKind {
        let cell = cell.trim().to_lowercase();
        let Some(colon) = cell.find(':') else {
            return ColumnKind::SampleAttribute;
        };
        let keyword = &cell[..colon];
        if keyword == "ignore" {
            return ColumnKind::Ignore;
        }
        if self.process.contains(keyword) {
            return ColumnKind::ProcessAttribute;
        }
        if self.sample.contains(keyword) {
            return ColumnKind::SampleAttribute;
        }
        if self.file.contains(keyword) {
            return ColumnKind::File;
        }
        ColumnKind::Unknown
    }
}

static REGISTRY: LazyLock<RwLock<KeywordRegistry>> =
    LazyLock::new(|| RwLock::new(KeywordRegistry::default()));

/// Validate the process-wide registry.
pub fn validate_keywords() -> EtlResult<()> {
    REGISTRY.read().validate()
}

/// Freeze the process-wide registry before a load begins.
pub fn freeze_keywords() {
    REGISTRY.write().freeze();
}

/// Clone the process-wide registry for use during one load.
pub fn keywords_snapshot() -> KeywordRegistry {
    REGISTRY.read().clone()
}

pub fn add_sample_keyword(keyword: &str) -> EtlResult<()> {
    REGISTRY.write().add_sample_keyword(keyword)
}

pub fn add_process_keyword(keyword: &str) -> EtlResult<()> {
    REGISTRY.write().add_process_keyword(keyword)
}

pub fn add_file_keyword(keyword: &str) -> EtlResult<()> {
    REGISTRY.write().add_file_keyword(keyword)
}
