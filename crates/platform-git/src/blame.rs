//! Per-file line attribution via `git blame --porcelain`
//!
//! Porcelain output is a sequence of blocks. Each block starts with a
//! header `<sha> <orig line> <final line> [<group size>]`; the first block
//! of a commit is followed by its metadata (`author`, `author-time`,
//! `author-tz`, ...). Every content line starts with a TAB and belongs to
//! the most recent header.

use crate::error::{GitError, GitResult};
use crate::walker::RepoFile;
use lazy_static::lazy_static;
use regex::Regex;
use repo_blame_core::{LineRecord, Warning, Warnings};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, warn};

lazy_static! {
    static ref HEADER: Regex = Regex::new(r"^([0-9a-f]{40}) (\d+) (\d+)(?: (\d+))?$").unwrap();
}

/// Bytes inspected when deciding whether a file is binary
pub const BINARY_SNIFF_LEN: usize = 8000;

/// Something that can produce porcelain blame output for a file
pub trait AttributionSource {
    /// Paths under version control, relative to `root`
    fn tracked_files(&self, root: &Path) -> GitResult<HashSet<PathBuf>>;

    /// Blame `relative` (a path inside `root`) and return the raw output
    fn blame(&self, root: &Path, relative: &Path) -> GitResult<String>;
}

/// Runs the `git` executable
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

impl AttributionSource for GitCli {
    fn tracked_files(&self, root: &Path) -> GitResult<HashSet<PathBuf>> {
        crate::repo::tracked_files(root)
    }

    fn blame(&self, root: &Path, relative: &Path) -> GitResult<String> {
        let output = Command::new("git")
            .args(["blame", "--porcelain", "--"])
            .arg(relative)
            .current_dir(root)
            .output()
            .map_err(GitError::Spawn)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(GitError::CommandFailed {
                command: format!("git blame --porcelain -- {}", relative.display()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[derive(Debug, Default)]
struct CommitMeta {
    author: Option<String>,
    time: Option<i64>,
    tz: Option<UtcOffset>,
}

/// Parse an `author-tz` value such as `+0200` or `-0530`
fn parse_tz(value: &str) -> Option<UtcOffset> {
    let (sign, digits) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => (1, value),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i8 = digits[..2].parse().ok()?;
    let minutes: i8 = digits[2..].parse().ok()?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

fn parse_error(line: usize, reason: impl Into<String>) -> GitError {
    GitError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Turn porcelain output into records for `relative`.
///
/// Line numbers are assigned sequentially from 1 in output order,
/// regardless of block boundaries.
pub fn parse_porcelain(output: &str, relative: &Path) -> GitResult<Vec<LineRecord>> {
    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut commits: HashMap<String, CommitMeta> = HashMap::new();
    let mut current: Option<String> = None;
    let mut records = Vec::new();

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(code) = line.strip_prefix('\t') {
            let sha = current
                .as_ref()
                .ok_or_else(|| parse_error(line_no, "content line before any header"))?;
            let meta = commits
                .get(sha)
                .ok_or_else(|| parse_error(line_no, "unknown commit"))?;
            let author = meta
                .author
                .clone()
                .ok_or_else(|| parse_error(line_no, format!("commit {} has no author", sha)))?;
            let time = meta
                .time
                .ok_or_else(|| parse_error(line_no, format!("commit {} has no author-time", sha)))?;
            let timestamp = OffsetDateTime::from_unix_timestamp(time)
                .map_err(|e| parse_error(line_no, e.to_string()))?
                .to_offset(meta.tz.unwrap_or(UtcOffset::UTC));

            records.push(LineRecord {
                file_path: relative.to_path_buf(),
                file_name: file_name.clone(),
                line_no: records.len() as u32 + 1,
                code: code.to_string(),
                commit: sha.clone(),
                timestamp,
                contributor: author,
            });
            continue;
        }

        if let Some(caps) = HEADER.captures(line) {
            let sha = caps[1].to_string();
            commits.entry(sha.clone()).or_default();
            current = Some(sha);
            continue;
        }

        // Metadata line for the current commit
        let Some(sha) = current.as_ref() else {
            return Err(parse_error(line_no, "metadata before any header"));
        };
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        let Some(meta) = commits.get_mut(sha) else {
            continue;
        };
        match key {
            "author" => meta.author = Some(value.to_string()),
            "author-time" => {
                let time = value
                    .trim()
                    .parse()
                    .map_err(|_| parse_error(line_no, format!("bad author-time '{}'", value)))?;
                meta.time = Some(time);
            }
            "author-tz" => meta.tz = parse_tz(value.trim()),
            _ => {}
        }
    }

    Ok(records)
}

fn sniff(path: &Path) -> std::io::Result<(bool, bool)> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; BINARY_SNIFF_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let empty = filled == 0;
    let binary = buf[..filled].contains(&0);
    Ok((empty, binary))
}

/// Attribute every line of one file.
///
/// Never fails: files that cannot be attributed yield no records and a
/// warning in `warnings`.
pub fn extract_file(
    source: &dyn AttributionSource,
    root: &Path,
    file: &RepoFile,
    warnings: &mut Warnings,
) -> Vec<LineRecord> {
    let path = file.relative.clone();

    match sniff(&file.absolute) {
        Ok((true, _)) => {
            debug!(path = %path.display(), "empty file");
            warnings.push(Warning::EmptyFile { path });
            return Vec::new();
        }
        Ok((_, true)) => {
            debug!(path = %path.display(), "binary file");
            warnings.push(Warning::BinaryFile { path });
            return Vec::new();
        }
        Ok(_) => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read file");
            warnings.push(Warning::AttributionFailed {
                path,
                detail: e.to_string(),
            });
            return Vec::new();
        }
    }

    let output = match source.blame(root, &file.relative) {
        Ok(output) => output,
        Err(e) if e.is_untracked() => {
            warn!(path = %path.display(), "not tracked at HEAD; skipping");
            let detail = match &e {
                GitError::CommandFailed { stderr, .. } => stderr.lines().next().unwrap_or("").to_string(),
                other => other.to_string(),
            };
            warnings.push(Warning::Untracked { path, detail });
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "blame failed; skipping");
            warnings.push(Warning::AttributionFailed {
                path,
                detail: e.to_string(),
            });
            return Vec::new();
        }
    };

    match parse_porcelain(&output, &file.relative) {
        Ok(records) => {
            debug!(path = %path.display(), lines = records.len(), "attributed");
            records
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unparsable blame output");
            warnings.push(Warning::UnparsableBlame {
                path,
                detail: e.to_string(),
            });
            Vec::new()
        }
    }
}
