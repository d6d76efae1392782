//! Output resolution
//!
//! Reconciles the requested output type(s), output file and output
//! directory into one absolute, write-ready path per output type. Conflicts
//! with a deterministic answer become warnings; everything else is a
//! [`BlameError::Configuration`].
//!
//! Rules, in order:
//! 1. An extension on the output file selects its type when no type was
//!    requested. When a different single type was requested, that type and
//!    its extension win and a warning is recorded.
//! 2. A directory embedded in the output file wins over the output
//!    directory (warning if they differ); a bare file name goes to the
//!    output directory, or the current directory.
//! 3. Without an output file, a default base name is used.
//! 4. Several types with one output file share its stem; the type matching
//!    the literal extension keeps it, the others get their own. One warning
//!    covers the whole set.
//! 5. The resolved directory must already exist and be writable.
//!
//! With no type and no extension the fallback types apply, then CSV.

use crate::error::{BlameError, BlameResult};
use crate::models::{AnalysisKind, OutputType, Warning};
use crate::request::OutputRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A single resolved write target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub output_type: OutputType,
    pub path: PathBuf,
}

/// Conflict-free mapping from output type to path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// One target per requested type, in request order
    pub targets: Vec<OutputTarget>,
    /// Conflicts resolved along the way
    pub warnings: Vec<Warning>,
}

impl OutputSpec {
    /// Path resolved for an output type
    pub fn path_for(&self, output_type: OutputType) -> Option<&Path> {
        self.targets
            .iter()
            .find(|t| t.output_type == output_type)
            .map(|t| t.path.as_path())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|t| t.path.as_path())
    }
}

/// Environment the resolver needs besides the request
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Base for relative paths and the fallback directory
    pub cwd: &'a Path,
    /// File stem used when no output file was given
    pub default_stem: &'a str,
}

/// Default output stem: `<repository>-<branch>-<analysis>`
pub fn default_stem(repository: &Path, branch: &str, kind: AnalysisKind) -> String {
    let repo_name = repository
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "repository".to_string());
    let branch = branch.trim().replace(['/', '\\'], "-");
    format!("{}-{}-{}", repo_name, branch, kind.slug())
}

/// Resolve an output request into concrete targets
pub fn resolve_output(request: &OutputRequest, ctx: &ResolveContext<'_>) -> BlameResult<OutputSpec> {
    let mut warnings = Vec::new();
    let mut types = dedup_types(&request.types);
    let requested_dir = request.dir.as_deref().map(|d| absolutize(ctx.cwd, d));

    let (directory, stem, literal) = match &request.file {
        Some(file) => {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    BlameError::configuration(format!(
                        "output file {} has no file name",
                        file.display()
                    ))
                })?;

            let literal = match file.extension() {
                Some(ext) => {
                    let ext = ext.to_string_lossy().to_string();
                    let output_type = OutputType::from_extension(&ext).ok_or_else(|| {
                        BlameError::configuration(format!(
                            "the extension .{} of {} is not a supported output type (use .csv or .xlsx)",
                            ext,
                            file.display()
                        ))
                    })?;
                    Some((output_type, ext))
                }
                None => None,
            };

            let embedded = file.parent().filter(|p| !p.as_os_str().is_empty());
            let directory = match (embedded, &requested_dir) {
                (Some(embedded), requested) => {
                    let embedded = absolutize(ctx.cwd, embedded);
                    if let Some(requested) = requested {
                        if !same_directory(&embedded, requested) {
                            warnings.push(Warning::DirectoryConflict {
                                embedded: embedded.clone(),
                                requested: requested.clone(),
                            });
                        }
                    }
                    embedded
                }
                (None, Some(requested)) => requested.clone(),
                (None, None) => ctx.cwd.to_path_buf(),
            };

            if let Some(name) = file.file_name() {
                reject_directory(&directory.join(name))?;
            }

            (directory, stem, literal)
        }
        None => (
            requested_dir.unwrap_or_else(|| ctx.cwd.to_path_buf()),
            ctx.default_stem.to_string(),
            None,
        ),
    };

    if let Some((literal_type, ext)) = &literal {
        let file = request.file.clone().unwrap_or_default();
        if types.is_empty() {
            types.push(*literal_type);
        } else if types.len() == 1 {
            if types[0] != *literal_type {
                warnings.push(Warning::ExtensionConflict {
                    file,
                    extension: ext.clone(),
                    used: types[0],
                });
            }
        } else {
            warnings.push(Warning::MultipleOutputTypes {
                file,
                types: types.clone(),
            });
        }
    } else if types.is_empty() {
        types = dedup_types(&request.fallback_types);
        if types.is_empty() {
            types.push(OutputType::Csv);
        }
    }

    ensure_writable_dir(&directory)?;

    let targets: Vec<OutputTarget> = types
        .into_iter()
        .map(|output_type| {
            let ext = match &literal {
                Some((literal_type, ext)) if *literal_type == output_type => ext.clone(),
                _ => output_type.extension().to_string(),
            };
            OutputTarget {
                output_type,
                path: directory.join(format!("{}.{}", stem, ext)),
            }
        })
        .collect();
    for target in &targets {
        reject_directory(&target.path)?;
    }

    Ok(OutputSpec { targets, warnings })
}

fn dedup_types(types: &[OutputType]) -> Vec<OutputType> {
    let mut out = Vec::with_capacity(types.len());
    for t in types {
        if !out.contains(t) {
            out.push(*t);
        }
    }
    out
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    normalize(&joined)
}

/// Lexically drop `.` and resolve `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => normalize(a) == normalize(b),
    }
}

fn reject_directory(path: &Path) -> BlameResult<()> {
    if path.is_dir() {
        return Err(BlameError::configuration(format!(
            "output file {} is a directory",
            path.display()
        )));
    }
    Ok(())
}

fn ensure_writable_dir(dir: &Path) -> BlameResult<()> {
    let metadata = fs::metadata(dir).map_err(|_| {
        BlameError::configuration(format!(
            "output directory {} does not exist",
            dir.display()
        ))
    })?;

    if !metadata.is_dir() {
        return Err(BlameError::configuration(format!(
            "output directory {} is not a directory",
            dir.display()
        )));
    }

    // the scratch file is removed on drop
    tempfile::tempfile_in(dir).map_err(|e| {
        BlameError::configuration(format!(
            "output directory {} is not writable: {}",
            dir.display(),
            e
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(types: &[OutputType], file: Option<&str>, dir: Option<&Path>) -> OutputRequest {
        OutputRequest {
            types: types.to_vec(),
            file: file.map(PathBuf::from),
            dir: dir.map(Path::to_path_buf),
            ..OutputRequest::default()
        }
    }

    fn resolve(req: &OutputRequest, cwd: &Path) -> BlameResult<OutputSpec> {
        resolve_output(
            req,
            &ResolveContext {
                cwd,
                default_stem: "project-main-line_blame",
            },
        )
    }

    #[test]
    fn test_extension_conflict_uses_requested_type() {
        let cwd = TempDir::new().unwrap();
        let spec = resolve(
            &request(&[OutputType::Csv], Some("report.xlsx"), None),
            cwd.path(),
        )
        .unwrap();

        assert_eq!(spec.targets.len(), 1);
        let path = spec.path_for(OutputType::Csv).unwrap();
        assert!(path.to_string_lossy().ends_with(".csv"));
        assert_eq!(path, cwd.path().join("report.csv"));
        assert_eq!(spec.warnings.len(), 1);
        assert!(matches!(
            spec.warnings[0],
            Warning::ExtensionConflict {
                used: OutputType::Csv,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_output_dir_fails() {
        let cwd = TempDir::new().unwrap();
        let missing = cwd.path().join("does-not-exist");
        let err = resolve(&request(&[], None, Some(&missing)), cwd.path()).unwrap_err();
        assert!(err.is_configuration());
        assert!(!missing.exists());
    }

    #[test]
    fn test_missing_embedded_dir_fails() {
        let cwd = TempDir::new().unwrap();
        let err = resolve(
            &request(&[], Some("nowhere/report.csv"), None),
            cwd.path(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_extension_selects_type() {
        let cwd = TempDir::new().unwrap();
        let spec = resolve(&request(&[], Some("report.xlsx"), None), cwd.path()).unwrap();
        assert_eq!(spec.targets.len(), 1);
        assert_eq!(spec.targets[0].output_type, OutputType::Excel);
        assert_eq!(spec.targets[0].path, cwd.path().join("report.xlsx"));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_default_name_in_output_dir() {
        let cwd = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let spec = resolve(&request(&[], None, Some(out.path())), cwd.path()).unwrap();
        assert_eq!(
            spec.path_for(OutputType::Csv).unwrap(),
            out.path().join("project-main-line_blame.csv")
        );
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_bare_name_goes_to_output_dir() {
        let cwd = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let spec = resolve(
            &request(&[OutputType::Excel], Some("summary"), Some(out.path())),
            cwd.path(),
        )
        .unwrap();
        assert_eq!(
            spec.path_for(OutputType::Excel).unwrap(),
            out.path().join("summary.xlsx")
        );
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_embedded_dir_wins_over_output_dir() {
        let cwd = TempDir::new().unwrap();
        let embedded = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let file = embedded.path().join("report.csv");
        let spec = resolve(
            &request(&[], file.to_str(), Some(other.path())),
            cwd.path(),
        )
        .unwrap();

        assert_eq!(spec.path_for(OutputType::Csv).unwrap(), file);
        assert_eq!(spec.warnings.len(), 1);
        assert!(matches!(spec.warnings[0], Warning::DirectoryConflict { .. }));
    }

    #[test]
    fn test_matching_dirs_do_not_warn() {
        let cwd = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join("out")).unwrap();
        let spec = resolve(
            &request(&[], Some("./out/report.csv"), Some(&cwd.path().join("out"))),
            cwd.path(),
        )
        .unwrap();
        assert!(spec.warnings.is_empty());
        assert_eq!(
            spec.path_for(OutputType::Csv).unwrap(),
            cwd.path().join("out").join("report.csv")
        );
    }

    #[test]
    fn test_multiple_types_share_stem() {
        let cwd = TempDir::new().unwrap();
        let spec = resolve(
            &request(
                &[OutputType::Excel, OutputType::Csv],
                Some("Report.CSV"),
                None,
            ),
            cwd.path(),
        )
        .unwrap();

        assert_eq!(spec.targets.len(), 2);
        assert_eq!(spec.targets[0].output_type, OutputType::Excel);
        assert_eq!(spec.targets[0].path, cwd.path().join("Report.xlsx"));
        // the matching type keeps the literal extension
        assert_eq!(spec.targets[1].path, cwd.path().join("Report.CSV"));
        assert_eq!(spec.warnings.len(), 1);
        assert!(matches!(
            spec.warnings[0],
            Warning::MultipleOutputTypes { .. }
        ));
    }

    #[test]
    fn test_no_type_no_extension_defaults_to_csv() {
        let cwd = TempDir::new().unwrap();
        let spec = resolve(&request(&[], Some("ledger"), None), cwd.path()).unwrap();
        assert_eq!(spec.targets.len(), 1);
        assert_eq!(spec.targets[0].path, cwd.path().join("ledger.csv"));
    }

    #[test]
    fn test_duplicate_types_collapsed() {
        let cwd = TempDir::new().unwrap();
        let spec = resolve(
            &request(&[OutputType::Csv, OutputType::Csv], None, None),
            cwd.path(),
        )
        .unwrap();
        assert_eq!(spec.targets.len(), 1);
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let cwd = TempDir::new().unwrap();
        let err = resolve(&request(&[], Some("report.txt"), None), cwd.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_output_file_naming_directory_fails() {
        let cwd = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join("reports")).unwrap();
        let err = resolve(&request(&[], Some("reports"), None), cwd.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_extension_beats_fallback_types() {
        let cwd = TempDir::new().unwrap();
        let mut req = request(&[], Some("report.xlsx"), None);
        req.fallback_types = vec![OutputType::Csv];
        let spec = resolve(&req, cwd.path()).unwrap();

        assert_eq!(spec.targets.len(), 1);
        assert_eq!(spec.targets[0].output_type, OutputType::Excel);
        assert_eq!(spec.targets[0].path, cwd.path().join("report.xlsx"));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_fallback_types_apply_without_extension() {
        let cwd = TempDir::new().unwrap();
        let mut req = request(&[], Some("report"), None);
        req.fallback_types = vec![OutputType::Excel, OutputType::Excel];
        let spec = resolve(&req, cwd.path()).unwrap();

        assert_eq!(spec.targets.len(), 1);
        assert_eq!(spec.targets[0].path, cwd.path().join("report.xlsx"));

        // explicit types still win over the fallback
        let mut req = request(&[OutputType::Csv], None, None);
        req.fallback_types = vec![OutputType::Excel];
        let spec = resolve(&req, cwd.path()).unwrap();
        assert_eq!(spec.targets[0].output_type, OutputType::Csv);
    }

    #[test]
    fn test_directory_check_uses_output_dir() {
        let cwd = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join("reports")).unwrap();

        // a same-named directory in the working directory is irrelevant
        let spec = resolve(&request(&[], Some("reports"), Some(out.path())), cwd.path()).unwrap();
        assert_eq!(spec.targets[0].path, out.path().join("reports.csv"));

        std::fs::create_dir(out.path().join("reports")).unwrap();
        let err = resolve(&request(&[], Some("reports"), Some(out.path())), cwd.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_target_path_naming_directory_fails() {
        let cwd = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join("summary.xlsx")).unwrap();
        let err = resolve(&request(&[OutputType::Excel], Some("summary"), None), cwd.path())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_writable_check_leaves_no_files() {
        let out = TempDir::new().unwrap();
        ensure_writable_dir(out.path()).unwrap();
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_dir_fails() {
        use std::os::unix::fs::PermissionsExt;

        let out = TempDir::new().unwrap();
        let locked = out.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // privileged users can write regardless of mode bits
        let privileged = std::fs::File::create(locked.join("check")).is_ok();
        let result = ensure_writable_dir(&locked);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        let err = result.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not writable"));
    }

    #[test]
    fn test_default_stem() {
        assert_eq!(
            default_stem(Path::new("/src/my-repo"), "feature/login", AnalysisKind::Breakdown),
            "my-repo-feature-login-breakdown"
        );
    }
}
