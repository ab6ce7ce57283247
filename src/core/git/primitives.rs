use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::command;

use super::{execute_git, git_stdout};

/// One line of `git log`: abbreviated sha and subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub sha: String,
    pub subject: String,
}

pub fn is_git_repo(path: &Path) -> bool {
    command::succeeded_in(path, "git", &["rev-parse", "--git-dir"])
}

pub fn require_git_repo(path: &Path) -> Result<()> {
    if is_git_repo(path) {
        Ok(())
    } else {
        Err(Error::git_command_failed(format!(
            "Not a git repository: {}",
            path.display()
        )))
    }
}

/// Check if a git working directory has no uncommitted changes.
pub fn is_workdir_clean(path: &Path) -> bool {
    match execute_git(path, &["status", "--porcelain"]) {
        Ok(o) if o.status.success() => o.stdout.is_empty(),
        _ => false,
    }
}

pub fn get_head_commit(path: &Path) -> Result<String> {
    git_stdout(path, &["rev-parse", "HEAD"])
}

/// Name of the checked-out branch. Detached HEAD is an error.
pub fn current_branch(path: &Path) -> Result<String> {
    let branch = git_stdout(path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    if branch == "HEAD" {
        return Err(Error::validation_invalid_argument(
            "branch",
            "HEAD is detached; check out a branch first",
            None,
            None,
        ));
    }
    Ok(branch)
}

/// Oldest root commit reachable from HEAD.
pub fn root_commit(path: &Path) -> Result<String> {
    let roots = git_stdout(path, &["rev-list", "--max-parents=0", "HEAD"])?;
    roots
        .lines()
        .last()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::git_command_failed("Repository has no commits"))
}

/// Number of commits in a revision range such as `1.2.3..HEAD`.
pub fn count_commits(path: &Path, range: &str) -> Result<u64> {
    let count = git_stdout(path, &["rev-list", "--count", range])?;
    count.parse::<u64>().map_err(|e| {
        Error::git_command_failed(format!("Unexpected rev-list output '{}': {}", count, e))
    })
}

/// Non-merge commits in `range`, newest first.
pub fn log_without_merges(path: &Path, range: &str) -> Result<Vec<LogEntry>> {
    let stdout = git_stdout(path, &["log", "--no-merges", "--format=%h|%s", range])?;
    Ok(parse_log(&stdout))
}

fn parse_log(stdout: &str) -> Vec<LogEntry> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let (sha, subject) = line.split_once('|')?;
            Some(LogEntry {
                sha: sha.to_string(),
                subject: subject.to_string(),
            })
        })
        .collect()
}
