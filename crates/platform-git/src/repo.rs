//! Repository checks and index listing

use crate::error::{GitError, GitResult};
use repo_blame_core::{BlameError, BlameResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Check that `path` is the root of a git working tree.
///
/// Returns the canonical root. The `.git` entry may be a directory or,
/// for worktrees and submodules, a file.
pub fn validate_repository(path: &Path) -> BlameResult<PathBuf> {
    if !path.exists() {
        return Err(BlameError::invalid_repository(path, "path does not exist"));
    }
    if !path.is_dir() {
        return Err(BlameError::invalid_repository(path, "not a directory"));
    }
    if !path.join(".git").exists() {
        return Err(BlameError::invalid_repository(
            path,
            "not the root of a git working tree (no .git entry)",
        ));
    }

    let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    debug!(root = %root.display(), "repository validated");
    Ok(root)
}

/// Name of the checked-out branch, if git can tell
pub fn current_branch(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if output.status.success() {
        let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    } else {
        None
    }
}

/// Paths in the index, relative to `root`
pub fn tracked_files(root: &Path) -> GitResult<HashSet<PathBuf>> {
    let output = Command::new("git")
        .args(["ls-files", "-z"])
        .current_dir(root)
        .output()
        .map_err(GitError::Spawn)?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: "git ls-files -z".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let tracked = parse_ls_files(&output.stdout);
    debug!(count = tracked.len(), "tracked files listed");
    Ok(tracked)
}

/// Split NUL-terminated `ls-files -z` output into paths
pub fn parse_ls_files(output: &[u8]) -> HashSet<PathBuf> {
    output
        .split(|b| *b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| PathBuf::from(String::from_utf8_lossy(entry).into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_repository(&dir.path().join("nope")).unwrap_err();
        assert!(err.is_invalid_repository());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_file_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = validate_repository(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_requires_git_entry() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_repository(dir.path()).is_err());

        fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(validate_repository(dir.path()).is_ok());
    }

    #[test]
    fn test_git_file_accepted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".git"), "gitdir: ../main/.git/worktrees/x\n").unwrap();
        assert!(validate_repository(dir.path()).is_ok());
    }

    #[test]
    fn test_parse_ls_files() {
        let tracked = parse_ls_files(b"src/lib.rs\0with space.md\0dir/t\xc3\xa9st.txt\0");
        assert_eq!(tracked.len(), 3);
        assert!(tracked.contains(Path::new("src/lib.rs")));
        assert!(tracked.contains(Path::new("with space.md")));
        assert!(tracked.contains(Path::new("dir/t\u{e9}st.txt")));
        assert!(parse_ls_files(b"").is_empty());
    }
}
