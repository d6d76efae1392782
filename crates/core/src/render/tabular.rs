//! Projection of analysis results into header + rows

use crate::breakdown::Breakdown;
use crate::models::{Attribute, LineRecord};
use crate::report::{AnalysisResult, Report};
use serde::Serialize;

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(u64),
    /// Percentage in the 0-100 range
    Percentage(f64),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Percentage(p) => write!(f, "{:.6}", p),
        }
    }
}

/// Rows ready for export, with a header naming each column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TabularData {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn attribute_cell(attribute: Attribute, record: &LineRecord) -> Cell {
    match attribute {
        Attribute::LineNo => Cell::Integer(u64::from(record.line_no)),
        other => Cell::Text(other.value(record)),
    }
}

/// One row per record, columns in the requested order
pub fn line_table(records: &[LineRecord], columns: &[Attribute]) -> TabularData {
    TabularData {
        header: columns.iter().map(|c| c.title().to_string()).collect(),
        rows: records
            .iter()
            .map(|r| columns.iter().map(|c| attribute_cell(*c, r)).collect())
            .collect(),
    }
}

/// One row per leaf path: value and percentage per level, then the count
pub fn breakdown_table(breakdown: &Breakdown) -> TabularData {
    let mut header = Vec::with_capacity(breakdown.depth() * 2 + 1);
    for attribute in &breakdown.attributes {
        header.push(attribute.title().to_string());
        header.push(format!("{} %", attribute.title()));
    }
    header.push("Lines".to_string());

    let rows = breakdown
        .flatten()
        .into_iter()
        .map(|row| {
            let mut cells: Vec<Cell> = row
                .levels
                .into_iter()
                .flat_map(|level| [Cell::Text(level.value), Cell::Percentage(level.percentage)])
                .collect();
            cells.push(Cell::Integer(row.count as u64));
            cells
        })
        .collect();

    TabularData { header, rows }
}

/// Table for whatever the report holds
pub fn report_table(report: &Report) -> TabularData {
    match &report.result {
        AnalysisResult::Lines(records) => line_table(records, &report.columns),
        AnalysisResult::Breakdown(breakdown) => breakdown_table(breakdown),
    }
}
