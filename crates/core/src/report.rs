//! Report structure for blame analysis results

use crate::breakdown::Breakdown;
use crate::models::{AnalysisKind, Attribute, LineRecord, Warning};
use crate::output::OutputTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The data an analysis produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AnalysisResult {
    /// Flat per-line ledger
    Lines(Vec<LineRecord>),
    /// Percentage breakdown tree
    Breakdown(Breakdown),
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Root of the analysed working tree
    pub repository: PathBuf,
    /// Analysis that was run
    pub kind: AnalysisKind,
    /// Columns or breakdown keys, in output order
    pub columns: Vec<Attribute>,
    /// Files that contributed at least one line
    pub files_analyzed: usize,
    /// Total attributed lines
    pub line_count: usize,
    /// The produced records or tree
    pub result: AnalysisResult,
    /// Resolved output targets
    pub outputs: Vec<OutputTarget>,
    /// Whether the outputs were actually written
    pub written: bool,
    /// Non-fatal warnings, in the order they were raised
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Create a report with no outputs or warnings yet
    pub fn new(
        repository: PathBuf,
        kind: AnalysisKind,
        columns: Vec<Attribute>,
        files_analyzed: usize,
        result: AnalysisResult,
    ) -> Self {
        let line_count = match &result {
            AnalysisResult::Lines(records) => records.len(),
            AnalysisResult::Breakdown(breakdown) => breakdown.total,
        };
        Self {
            repository,
            kind,
            columns,
            files_analyzed,
            line_count,
            result,
            outputs: Vec::new(),
            written: false,
            warnings: Vec::new(),
        }
    }

    /// The flat records, for line-level analyses
    pub fn records(&self) -> Option<&[LineRecord]> {
        match &self.result {
            AnalysisResult::Lines(records) => Some(records),
            AnalysisResult::Breakdown(_) => None,
        }
    }

    /// The breakdown tree, for aggregating analyses
    pub fn breakdown(&self) -> Option<&Breakdown> {
        match &self.result {
            AnalysisResult::Breakdown(breakdown) => Some(breakdown),
            AnalysisResult::Lines(_) => None,
        }
    }

    /// Check if any warnings were raised
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Add a warning to the report
    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}
