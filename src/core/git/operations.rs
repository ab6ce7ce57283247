use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

use super::{command_failed, execute_git};

#[derive(Debug, Clone, Serialize)]
pub struct GitOutput {
    pub action: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl GitOutput {
    pub(super) fn from_output(action: &str, output: &std::process::Output) -> Self {
        Self {
            action: action.to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// Run a mutating git command; any non-zero exit aborts with `git.command_failed`.
pub(super) fn run_git(path: &Path, action: &str, args: &[&str]) -> Result<GitOutput> {
    log_status!("git", "git {}", args.join(" "));
    let output = execute_git(path, args).map_err(|e| {
        Error::git_command_failed(format!("Failed to run git {}: {}", args.join(" "), e))
    })?;

    if !output.status.success() {
        return Err(command_failed(args, &output));
    }

    Ok(GitOutput::from_output(action, &output))
}

/// Stage exactly `files` and commit only them.
pub fn commit_paths(path: &Path, message: &str, files: &[&str]) -> Result<GitOutput> {
    if files.is_empty() {
        return Err(Error::validation_missing_argument(vec!["files".to_string()]));
    }

    let mut add_args = vec!["add", "--"];
    add_args.extend_from_slice(files);
    run_git(path, "add", &add_args)?;

    let mut commit_args = vec!["commit", "-m", message, "--"];
    commit_args.extend_from_slice(files);
    run_git(path, "commit", &commit_args)
}

pub fn push_branch(path: &Path, remote: &str, branch: &str) -> Result<GitOutput> {
    run_git(path, "push", &["push", remote, branch])
}

pub fn push_tag(path: &Path, remote: &str, tag: &str, force: bool) -> Result<GitOutput> {
    let refspec = format!("refs/tags/{}", tag);
    let mut args = vec!["push"];
    if force {
        args.push("--force");
    }
    args.push(remote);
    args.push(&refspec);
    run_git(path, "push_tag", &args)
}
