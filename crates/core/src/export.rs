//! Persisting tabular results to resolved output targets
//!
//! Every target is rendered into a temporary file next to its final path
//! first. Only when all of them rendered are they moved into place, so a
//! failure never leaves a partial set of outputs behind.

use crate::error::{BlameError, BlameResult};
use crate::models::{OutputType, Warning, Warnings};
use crate::output::OutputSpec;
use crate::render::delimited::write_csv;
use crate::render::tabular::TabularData;
use crate::render::workbook::{write_workbook, EXCEL_CELL_LIMIT};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Write `data` to every target in `spec`, returning the written paths.
///
/// Cells cut to fit a workbook are reported through `warnings`.
pub fn export(
    data: &TabularData,
    sheet_name: &str,
    spec: &OutputSpec,
    warnings: &mut Warnings,
) -> BlameResult<Vec<PathBuf>> {
    let mut staged: Vec<(NamedTempFile, &Path)> = Vec::with_capacity(spec.targets.len());

    for target in &spec.targets {
        let path = target.path.as_path();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let suffix = format!(".{}", target.output_type.extension());

        let mut temp = tempfile::Builder::new()
            .prefix(".repo-blame-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| BlameError::write(path, e))?;

        match target.output_type {
            OutputType::Csv => write_csv(data, temp.as_file_mut())
                .map_err(|e| BlameError::write(path, io::Error::other(e.to_string())))?,
            OutputType::Excel => {
                let truncated = write_workbook(data, sheet_name, temp.as_file_mut())
                    .map_err(|e| BlameError::write(path, io::Error::other(e.to_string())))?;
                if truncated > 0 {
                    warnings.push(Warning::TruncatedCells {
                        path: path.to_path_buf(),
                        count: truncated,
                        limit: EXCEL_CELL_LIMIT,
                    });
                }
            }
        }

        debug!(path = %path.display(), rows = data.len(), "staged output");
        staged.push((temp, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (temp, path) in staged {
        temp.persist(path)
            .map_err(|e| BlameError::write(path, e.error))?;
        info!(path = %path.display(), "wrote output");
        written.push(path.to_path_buf());
    }

    Ok(written)
}
