//! repo-blame-git: Git collectors for repo-blame
//!
//! This crate walks a git working tree, attributes every file through
//! `git blame --porcelain` and drives the full analysis pipeline on top of
//! `repo-blame-core`.

pub mod analyzer;
pub mod blame;
pub mod error;
pub mod repo;
pub mod walker;

pub use analyzer::{collect_records, run_analysis};
pub use blame::{extract_file, parse_porcelain, AttributionSource, GitCli};
pub use error::{GitError, GitResult};
pub use repo::{current_branch, tracked_files, validate_repository};
pub use walker::{PathWalker, RepoFile};
