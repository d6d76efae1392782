//! Output rendering for reports

pub mod delimited;
pub mod json;
pub mod tabular;
pub mod text;
pub mod workbook;

pub use json::render_json_string;
pub use tabular::{report_table, Cell, TabularData};
pub use text::{render_short, render_tree};
