//! The validated request handed from the command line to the core

use crate::error::{BlameError, BlameResult};
use crate::models::{AnalysisKind, Attribute, OutputType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// What to analyse and where to write it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Root of the working tree
    pub repository: PathBuf,
    /// Analysis to perform
    pub kind: AnalysisKind,
    /// Columns (line_blame) or breakdown keys, in order; empty means default
    pub columns: Vec<Attribute>,
    /// Requested output location and formats
    pub output: OutputRequest,
    /// File discovery options
    pub walk: WalkOptions,
    /// Resolve outputs but write nothing
    pub dry_run: bool,
}

/// Raw, possibly inconsistent, output options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRequest {
    /// Requested formats; empty means infer
    pub types: Vec<OutputType>,
    /// Formats used when neither `types` nor the file's extension decides
    #[serde(default)]
    pub fallback_types: Vec<OutputType>,
    /// Bare name, name with extension, or path
    pub file: Option<PathBuf>,
    /// Directory for outputs
    pub dir: Option<PathBuf>,
}

/// Exclusion rules and limits for file discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkOptions {
    /// Directory names to skip, in addition to the defaults
    pub ignore_dirs: Vec<String>,
    /// File extensions to skip, in addition to the defaults
    pub ignore_file_types: Vec<String>,
    /// Stop after this many files produced records
    pub file_limit: Option<usize>,
}

impl AnalysisRequest {
    pub fn new(repository: impl Into<PathBuf>, kind: AnalysisKind) -> Self {
        Self {
            repository: repository.into(),
            kind,
            columns: Vec::new(),
            output: OutputRequest::default(),
            walk: WalkOptions::default(),
            dry_run: false,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Attribute>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_output(mut self, output: OutputRequest) -> Self {
        self.output = output;
        self
    }

    /// Columns actually used, falling back to the analysis defaults
    pub fn effective_columns(&self) -> Vec<Attribute> {
        if self.columns.is_empty() {
            self.kind.default_columns()
        } else {
            self.columns.clone()
        }
    }

    /// Reject requests no analysis can satisfy
    pub fn validate(&self) -> BlameResult<()> {
        if self.kind == AnalysisKind::Contributions
            && !self.columns.is_empty()
            && self.columns != [Attribute::Contributor]
        {
            return Err(BlameError::configuration(
                "the contributions analysis always groups by contributor; use `breakdown` to choose attributes",
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(*column) {
                return Err(BlameError::configuration(format!(
                    "column '{}' was requested more than once",
                    column
                )));
            }
        }

        if self.walk.file_limit == Some(0) {
            return Err(BlameError::configuration("file limit must be at least 1"));
        }

        Ok(())
    }
}
