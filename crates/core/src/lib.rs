//! repo-blame-core: Core models, aggregation and export for repo-blame
//!
//! This crate is VCS-agnostic. It holds the attributed-line model, the
//! breakdown engine, output resolution and the CSV/Excel exporters. Walking
//! a repository and running blame lives in `repo-blame-git`.
//!
//! # Modules
//!
//! - [`models`] - Line records, attributes, analysis kinds and warnings
//! - [`request`] - The analysis request handed over by the command line
//! - [`breakdown`] - Hierarchical percentage breakdowns
//! - [`output`] - Output type / file / directory resolution
//! - [`export`] - Staged writing of CSV and Excel files
//! - [`report`] - The Report struct that aggregates analysis results
//! - [`render`] - Tabular projection plus text and JSON formatters
//!
//! # Example
//!
//! ```
//! use repo_blame_core::{build_breakdown, Attribute, LineRecord};
//! use std::path::PathBuf;
//! use time::OffsetDateTime;
//!
//! let record = LineRecord {
//!     file_path: PathBuf::from("src/main.rs"),
//!     file_name: "main.rs".to_string(),
//!     line_no: 1,
//!     code: "fn main() {}".to_string(),
//!     commit: "0".repeat(40),
//!     timestamp: OffsetDateTime::UNIX_EPOCH,
//!     contributor: "Ada".to_string(),
//! };
//! let breakdown = build_breakdown(&[record], &[Attribute::Contributor]).unwrap();
//! assert_eq!(breakdown.nodes[0].percentage, 100.0);
//! ```

pub mod breakdown;
pub mod error;
pub mod export;
pub mod models;
pub mod output;
pub mod render;
pub mod report;
pub mod request;

// Re-export commonly used types at crate root
pub use breakdown::{build_breakdown, Breakdown, BreakdownNode, BreakdownRow};
pub use error::{BlameError, BlameResult};
pub use export::export;
pub use models::{
    file_type_of, AnalysisKind, Attribute, LineRecord, OutputType, Warning, Warnings,
};
pub use output::{default_stem, resolve_output, OutputSpec, OutputTarget, ResolveContext};
pub use report::{AnalysisResult, Report};
pub use request::{AnalysisRequest, OutputRequest, WalkOptions};
