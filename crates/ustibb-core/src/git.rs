//! Git access
//!
//! Repository discovery and the commit/file-change source used by the run pipeline.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::DateTime;
use walkdir::WalkDir;

use crate::commit::{ChangeStatus, CommitRecord, FileChange};
use crate::error::{Result, UstibbError};

/// Directories never descended into while looking for repositories
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Field separator of the `git log` format below (ASCII unit separator)
const FIELD_SEP: char = '\x1f';
const LOG_FORMAT: &str = "--pretty=format:%H%x1f%an%x1f%ae%x1f%aI%x1f%s";

/// History filter applied to every repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQuery {
    /// Author matchers, OR-ed. Empty means every author.
    pub authors: Vec<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Supplies commits and their changed files for one repository
pub trait CommitSource {
    fn commits(&self, repo: &Path, query: &CommitQuery) -> Result<Vec<CommitRecord>>;

    fn files(&self, repo: &Path, hash: &str) -> Result<Vec<FileChange>>;
}

/// [`CommitSource`] backed by the `git` executable
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, repo: &Path, args: &[String]) -> Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .map_err(|e| UstibbError::Git(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UstibbError::Git(format!(
                "git {} failed in {}: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                repo.display(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl CommitSource for GitCli {
    fn commits(&self, repo: &Path, query: &CommitQuery) -> Result<Vec<CommitRecord>> {
        let output = self.run(repo, &log_args(query))?;
        Ok(parse_log_output(&output))
    }

    fn files(&self, repo: &Path, hash: &str) -> Result<Vec<FileChange>> {
        let args = [
            "diff-tree",
            "--no-commit-id",
            "--name-status",
            "-r",
            hash,
        ]
        .map(String::from);
        let output = self.run(repo, &args)?;
        Ok(parse_name_status(&output))
    }
}

/// Arguments of the `git log` call for a query.
///
/// Each matcher gets its own `--author`; git ORs them.
pub fn log_args(query: &CommitQuery) -> Vec<String> {
    let mut args = vec!["log".to_string()];
    for author in &query.authors {
        args.push(format!("--author={}", escape_author_pattern(author)));
    }
    if let Some(since) = &query.since {
        args.push(format!("--since={}", since));
    }
    if let Some(until) = &query.until {
        args.push(format!("--until={}", until));
    }
    args.push(LOG_FORMAT.to_string());
    args
}

/// Escape characters special in git's default (basic) regular expressions
pub fn escape_author_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '.' | '[' | ']' | '*' | '^' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Parse `git log` output produced with the unit-separated format
pub fn parse_log_output(output: &str) -> Vec<CommitRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.splitn(5, FIELD_SEP);
            let hash = fields.next()?.trim();
            if hash.is_empty() {
                return None;
            }
            let name = fields.next().unwrap_or_default();
            let email = fields.next().unwrap_or_default();
            let date = fields
                .next()
                .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok());
            let subject = fields.next().unwrap_or_default();

            Some(
                CommitRecord::new(hash, subject)
                    .with_author(name, email)
                    .with_date(date),
            )
        })
        .collect()
}

/// Parse `git diff-tree --name-status` output.
///
/// Lines not starting with an uppercase status letter are ignored. Renames and copies
/// list source and destination; the destination is kept.
pub fn parse_name_status(output: &str) -> Vec<FileChange> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_uppercase()))
        .filter_map(|line| {
            let (token, rest) = line.split_once(|c: char| c.is_whitespace())?;
            let status = ChangeStatus::from_token(token)?;
            let path = match status {
                ChangeStatus::Renamed | ChangeStatus::Copied => {
                    rest.rsplit('\t').next().unwrap_or(rest)
                }
                _ => rest,
            }
            .trim();
            if path.is_empty() {
                return None;
            }
            Some(FileChange::new(path, status))
        })
        .collect()
}

/// Every git repository under `root`, depth-first in file-name order.
///
/// A directory holding a `.git` directory is a repository and is not descended
/// further. Unreadable directories are skipped.
pub fn discover_repos(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(UstibbError::ReposDirNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut repos = Vec::new();
    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if entry.depth() > 0 && SKIPPED_DIRS.iter().any(|skip| name == *skip) {
            walker.skip_current_dir();
            continue;
        }

        if entry.path().join(".git").is_dir() {
            repos.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    Ok(repos)
}
