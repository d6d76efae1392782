//! Discovery of candidate files in a working tree

use repo_blame_core::{file_type_of, WalkOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Git's own metadata entry; a directory, or a file in worktrees and submodules
const GIT_ENTRY: &str = ".git";

/// Directories skipped in every walk
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[GIT_ENTRY];

/// File types skipped in every walk
pub const DEFAULT_IGNORE_FILE_TYPES: &[&str] = &["png", "jpeg", "jpg", "gif", "svg"];

/// A file found under the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub absolute: PathBuf,
    /// Path relative to the repository root
    pub relative: PathBuf,
}

/// Walks a repository, honouring exclusion rules
#[derive(Debug, Clone)]
pub struct PathWalker {
    root: PathBuf,
    ignore_dirs: HashSet<String>,
    ignore_file_types: HashSet<String>,
    tracked: Option<HashSet<PathBuf>>,
}

/// Lower-case a file type and drop a leading dot
pub fn normalize_file_type(file_type: &str) -> String {
    file_type.trim().trim_start_matches('.').to_lowercase()
}

impl PathWalker {
    /// Walker with the default exclusions extended by `options`
    pub fn new(root: impl Into<PathBuf>, options: &WalkOptions) -> Self {
        let ignore_dirs = DEFAULT_IGNORE_DIRS
            .iter()
            .map(|d| d.to_string())
            .chain(options.ignore_dirs.iter().map(|d| d.trim().trim_matches('/').to_string()))
            .filter(|d| !d.is_empty())
            .collect();
        let ignore_file_types = DEFAULT_IGNORE_FILE_TYPES
            .iter()
            .map(|t| t.to_string())
            .chain(options.ignore_file_types.iter().map(|t| normalize_file_type(t)))
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            root: root.into(),
            ignore_dirs,
            ignore_file_types,
            tracked: None,
        }
    }

    /// Only yield files whose relative path is in `tracked`
    pub fn with_tracked(mut self, tracked: HashSet<PathBuf>) -> Self {
        self.tracked = Some(tracked);
        self
    }

    fn is_skipped_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name == GIT_ENTRY
            || (entry.file_type().is_dir() && self.ignore_dirs.contains(name.as_ref()))
    }

    fn is_tracked(&self, relative: &Path) -> bool {
        self.tracked
            .as_ref()
            .map_or(true, |tracked| tracked.contains(relative))
    }

    /// Whether a file is excluded by its type
    pub fn is_ignored_file(&self, path: &Path) -> bool {
        self.ignore_file_types.contains(&file_type_of(path))
    }

    /// Start a fresh walk; files come in file-name order within each directory.
    ///
    /// Untracked files are skipped silently once a tracked set is attached.
    ///
    /// Unreadable entries are yielded as errors so the caller can report
    /// them and carry on.
    pub fn files(&self) -> impl Iterator<Item = Result<RepoFile, walkdir::Error>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !self.is_skipped_entry(e))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() || self.is_ignored_file(entry.path()) {
                        return None;
                    }
                    let absolute = entry.into_path();
                    let relative = absolute
                        .strip_prefix(&self.root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| absolute.clone());
                    if !self.is_tracked(&relative) {
                        return None;
                    }
                    Some(Ok(RepoFile { absolute, relative }))
                }
                Err(e) => Some(Err(e)),
            })
    }
}
