//! Full analysis pipeline
//!
//! Validates the request and repository, resolves outputs, attributes
//! every file, aggregates and finally exports.

use crate::blame::{extract_file, AttributionSource};
use crate::repo::{current_branch, validate_repository};
use crate::walker::PathWalker;
use repo_blame_core::render::report_table;
use repo_blame_core::{
    build_breakdown, default_stem, export, resolve_output, AnalysisRequest, AnalysisResult,
    BlameError, BlameResult, LineRecord, Report, ResolveContext, WalkOptions, Warning, Warnings,
};
use std::path::Path;
use tracing::{debug, info};

/// Branch name used in default output names when git cannot tell
pub const UNKNOWN_BRANCH: &str = "unknown";

/// Records for every attributable tracked file, plus how many files contributed
pub fn collect_records(
    root: &Path,
    options: &WalkOptions,
    source: &dyn AttributionSource,
    warnings: &mut Warnings,
) -> BlameResult<(Vec<LineRecord>, usize)> {
    let tracked = source
        .tracked_files(root)
        .map_err(|e| BlameError::invalid_repository(root, e.to_string()))?;
    debug!(tracked = tracked.len(), "index listed");
    let walker = PathWalker::new(root, options).with_tracked(tracked);
    let mut records = Vec::new();
    let mut files = 0usize;

    for entry in walker.files() {
        let file = match entry {
            Ok(file) => file,
            Err(e) => {
                warnings.push(Warning::WalkFailed {
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let mut lines = extract_file(source, root, &file, warnings);
        if lines.is_empty() {
            continue;
        }
        records.append(&mut lines);
        files += 1;

        if options.file_limit.is_some_and(|limit| files >= limit) {
            info!(files, "file limit reached");
            break;
        }
    }

    Ok((records, files))
}

/// Run an analysis end to end and return its report
pub fn run_analysis(
    request: &AnalysisRequest,
    source: &dyn AttributionSource,
    cwd: &Path,
) -> BlameResult<Report> {
    request.validate()?;

    let root = validate_repository(&cwd.join(&request.repository))?;
    let columns = request.effective_columns();
    let mut warnings = Warnings::new();

    let branch = current_branch(&root).unwrap_or_else(|| {
        warnings.push(Warning::Other(format!(
            "Could not determine the current branch; using '{}' in default file names",
            UNKNOWN_BRANCH
        )));
        UNKNOWN_BRANCH.to_string()
    });

    // Resolve before attributing so configuration errors surface early
    let stem = default_stem(&root, &branch, request.kind);
    let spec = resolve_output(
        &request.output,
        &ResolveContext {
            cwd,
            default_stem: &stem,
        },
    )?;
    warnings.merge(spec.warnings.iter().cloned());
    debug!(targets = spec.targets.len(), "outputs resolved");

    info!(root = %root.display(), analysis = %request.kind, "attributing files");
    let (records, files_analyzed) = collect_records(&root, &request.walk, source, &mut warnings)?;
    info!(files = files_analyzed, lines = records.len(), "attribution finished");

    let result = if request.kind.is_breakdown() {
        AnalysisResult::Breakdown(build_breakdown(&records, &columns)?)
    } else {
        AnalysisResult::Lines(records)
    };

    let mut report = Report::new(root, request.kind, columns, files_analyzed, result);
    report.outputs = spec.targets.clone();

    if request.dry_run {
        info!("dry run; nothing written");
    } else {
        let table = report_table(&report);
        export(&table, request.kind.slug(), &spec, &mut warnings)?;
        report.written = true;
    }

    report.warnings = warnings.into_vec();
    Ok(report)
}
