//! Core domain models for repo-blame
//!
//! These types are VCS-agnostic and describe attributed lines, the
//! attributes they can be projected onto, and the warnings raised along
//! the way.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One attributed line of source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Path of the file relative to the repository root
    pub file_path: PathBuf,
    /// File name portion of `file_path`
    pub file_name: String,
    /// 1-based line number within the file
    pub line_no: u32,
    /// Line content without the trailing newline
    pub code: String,
    /// Commit that last touched the line
    pub commit: String,
    /// Author time of that commit, in the author's offset
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Author of that commit
    pub contributor: String,
}

impl LineRecord {
    /// Lower-cased extension of the file, without the dot
    pub fn file_type(&self) -> String {
        file_type_of(&self.file_path)
    }
}

/// Derive the file type of a path.
///
/// Dotfiles such as `.gitignore` have no extension as far as [`Path`] is
/// concerned; their type is the name without the leading dot.
pub fn file_type_of(path: &Path) -> String {
    if let Some(ext) = path.extension() {
        return ext.to_string_lossy().to_lowercase();
    }
    path.file_name()
        .map(|name| name.to_string_lossy())
        .filter(|name| name.starts_with('.'))
        .map(|name| name.trim_start_matches('.').to_lowercase())
        .unwrap_or_default()
}

/// A projection of a [`LineRecord`] usable as a table column or a
/// breakdown key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FileName,
    FileType,
    FilePath,
    Commit,
    Contributor,
    LineNo,
    Datetime,
    Date,
    Code,
}

/// Pure accessor from a record to the value of one attribute
pub type Accessor = fn(&LineRecord) -> String;

impl Attribute {
    /// Every attribute, in default column order
    pub const ALL: [Attribute; 9] = [
        Attribute::FileName,
        Attribute::FileType,
        Attribute::FilePath,
        Attribute::Commit,
        Attribute::Contributor,
        Attribute::LineNo,
        Attribute::Datetime,
        Attribute::Date,
        Attribute::Code,
    ];

    /// Name used on the command line
    pub fn slug(self) -> &'static str {
        match self {
            Attribute::FileName => "file_name",
            Attribute::FileType => "file_type",
            Attribute::FilePath => "file_path",
            Attribute::Commit => "commit",
            Attribute::Contributor => "contributor",
            Attribute::LineNo => "line_no",
            Attribute::Datetime => "datetime",
            Attribute::Date => "date",
            Attribute::Code => "code",
        }
    }

    /// Header text for tabular output
    pub fn title(self) -> &'static str {
        match self {
            Attribute::FileName => "File Name",
            Attribute::FileType => "File Type",
            Attribute::FilePath => "File Path",
            Attribute::Commit => "Commit",
            Attribute::Contributor => "Contributor",
            Attribute::LineNo => "Line No.",
            Attribute::Datetime => "Date/Time",
            Attribute::Date => "Date",
            Attribute::Code => "Code",
        }
    }

    /// The accessor that reads this attribute off a record
    pub fn accessor(self) -> Accessor {
        match self {
            Attribute::FileName => |r: &LineRecord| r.file_name.clone(),
            Attribute::FileType => |r: &LineRecord| r.file_type(),
            Attribute::FilePath => |r: &LineRecord| r.file_path.to_string_lossy().replace('\\', "/"),
            Attribute::Commit => |r: &LineRecord| r.commit.clone(),
            Attribute::Contributor => |r: &LineRecord| r.contributor.clone(),
            Attribute::LineNo => |r: &LineRecord| r.line_no.to_string(),
            Attribute::Datetime => |r: &LineRecord| r.timestamp.format(&Rfc3339).unwrap_or_default(),
            Attribute::Date => |r: &LineRecord| r.timestamp.date().to_string(),
            Attribute::Code => |r: &LineRecord| r.code.clone(),
        }
    }

    /// Read this attribute off a record
    pub fn value(self, record: &LineRecord) -> String {
        (self.accessor())(record)
    }

    /// Comma-separated list of valid slugs, for error messages
    pub fn valid_slugs() -> String {
        Self::ALL
            .iter()
            .map(|a| a.slug())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.slug() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown column '{}' (expected one of: {})",
                    s.trim(),
                    Self::valid_slugs()
                )
            })
    }
}

/// The analysis to run over the collected records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Flat per-line ledger
    LineBlame,
    /// Share of lines per contributor
    Contributions,
    /// Nested breakdown over the requested attributes
    Breakdown,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::LineBlame,
        AnalysisKind::Contributions,
        AnalysisKind::Breakdown,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            AnalysisKind::LineBlame => "line_blame",
            AnalysisKind::Contributions => "contributions",
            AnalysisKind::Breakdown => "breakdown",
        }
    }

    /// Columns (or breakdown keys) used when none were requested
    pub fn default_columns(self) -> Vec<Attribute> {
        match self {
            AnalysisKind::LineBlame => Attribute::ALL.to_vec(),
            AnalysisKind::Contributions | AnalysisKind::Breakdown => vec![Attribute::Contributor],
        }
    }

    /// Whether the analysis aggregates records into a breakdown tree
    pub fn is_breakdown(self) -> bool {
        !matches!(self, AnalysisKind::LineBlame)
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        match wanted.as_str() {
            "line_blame" | "lines" => Ok(AnalysisKind::LineBlame),
            "contributions" | "contributions_by_line" => Ok(AnalysisKind::Contributions),
            "breakdown" => Ok(AnalysisKind::Breakdown),
            _ => Err(format!(
                "unknown analysis '{}' (expected line_blame, contributions or breakdown)",
                s.trim()
            )),
        }
    }
}

/// A file format the exporter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Csv,
    Excel,
}

impl OutputType {
    pub const ALL: [OutputType; 2] = [OutputType::Csv, OutputType::Excel];

    pub fn slug(self) -> &'static str {
        match self {
            OutputType::Csv => "csv",
            OutputType::Excel => "excel",
        }
    }

    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputType::Csv => "csv",
            OutputType::Excel => "xlsx",
        }
    }

    /// Map a file extension (dot optional, any case) to its output type
    pub fn from_extension(ext: &str) -> Option<OutputType> {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        Self::ALL.iter().copied().find(|t| t.extension() == ext)
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.slug() == wanted || t.extension() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown output type '{}' (expected csv or excel)",
                    s.trim()
                )
            })
    }
}

/// Non-fatal conditions raised while analysing or resolving output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum Warning {
    /// File has no content to attribute
    EmptyFile { path: PathBuf },
    /// File looks binary and was not attributed
    BinaryFile { path: PathBuf },
    /// File is not tracked at HEAD (untracked or renamed away)
    Untracked { path: PathBuf, detail: String },
    /// The attribution command failed for this file
    AttributionFailed { path: PathBuf, detail: String },
    /// The attribution output could not be parsed
    UnparsableBlame { path: PathBuf, detail: String },
    /// A directory entry could not be read during discovery
    WalkFailed { detail: String },
    /// The output file extension disagrees with the requested output type
    ExtensionConflict {
        file: PathBuf,
        extension: String,
        used: OutputType,
    },
    /// The output file's directory disagrees with the output directory
    DirectoryConflict { embedded: PathBuf, requested: PathBuf },
    /// Several output types share one output file name
    MultipleOutputTypes {
        file: PathBuf,
        types: Vec<OutputType>,
    },
    /// Workbook cells were cut to the spreadsheet's length limit
    TruncatedCells {
        path: PathBuf,
        count: usize,
        limit: usize,
    },
    /// Generic warning
    Other(String),
}

impl Warning {
    /// Informational notes do not indicate a problem with the input
    pub fn is_informational(&self) -> bool {
        matches!(self, Warning::EmptyFile { .. } | Warning::BinaryFile { .. })
    }

    /// Raised by output resolution rather than attribution
    pub fn is_output_conflict(&self) -> bool {
        matches!(
            self,
            Warning::ExtensionConflict { .. }
                | Warning::DirectoryConflict { .. }
                | Warning::MultipleOutputTypes { .. }
        )
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::EmptyFile { path } => write!(f, "{} is empty; skipped", path.display()),
            Warning::BinaryFile { path } => {
                write!(f, "{} appears to be binary; skipped", path.display())
            }
            Warning::Untracked { path, detail } => write!(
                f,
                "{} is not tracked at HEAD; skipped ({})",
                path.display(),
                detail
            ),
            Warning::AttributionFailed { path, detail } => {
                write!(f, "Could not blame {}: {}", path.display(), detail)
            }
            Warning::UnparsableBlame { path, detail } => {
                write!(f, "Could not parse blame for {}: {}", path.display(), detail)
            }
            Warning::WalkFailed { detail } => write!(f, "Could not read entry: {}", detail),
            Warning::ExtensionConflict {
                file,
                extension,
                used,
            } => write!(
                f,
                "Output file {} has extension .{} but output type {} was requested; writing .{} instead",
                file.display(),
                extension,
                used,
                used.extension()
            ),
            Warning::DirectoryConflict {
                embedded,
                requested,
            } => write!(
                f,
                "Output directory {} is ignored; the output file's directory {} is used",
                requested.display(),
                embedded.display()
            ),
            Warning::MultipleOutputTypes { file, types } => {
                let exts: Vec<String> = types.iter().map(|t| format!(".{}", t.extension())).collect();
                write!(
                    f,
                    "Several output types requested for {}; writing {} alongside each other",
                    file.display(),
                    exts.join(", ")
                )
            }
            Warning::TruncatedCells { path, count, limit } => write!(
                f,
                "{} cell(s) in {} exceeded {} characters and were truncated",
                count,
                path.display(),
                limit
            ),
            Warning::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Accumulator threaded through every stage of an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        tracing::debug!(%warning, "warning recorded");
        self.0.push(warning);
    }

    /// Merge warnings produced by a nested call
    pub fn merge(&mut self, other: impl IntoIterator<Item = Warning>) {
        for warning in other {
            self.push(warning);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}
