use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::utils::command;

use super::operations::{run_git, GitOutput};
use super::{execute_git, git_stdout};

const SIGNATURE_MARKERS: [&str; 2] = ["-----BEGIN PGP SIGNATURE-----", "-----BEGIN SSH SIGNATURE-----"];

/// Where an annotated tag's message comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMessage {
    Inline(String),
    File(PathBuf),
    /// Let git open the operator's editor.
    Editor,
}

/// Create an annotated tag at HEAD.
pub fn create_annotated_tag(path: &Path, name: &str, message: &TagMessage) -> Result<GitOutput> {
    match message {
        TagMessage::Inline(msg) => run_git(path, "tag", &["tag", "-a", name, "-m", msg]),
        TagMessage::File(file) => {
            let file = file.to_string_lossy();
            run_git(path, "tag", &["tag", "-a", name, "-F", &file])
        }
        TagMessage::Editor => create_tag_with_editor(path, name),
    }
}

fn create_tag_with_editor(path: &Path, name: &str) -> Result<GitOutput> {
    log_status!("git", "git tag -a {} (opening editor)", name);
    let status = Command::new("git")
        .args(["tag", "-a", name])
        .current_dir(path)
        .status()
        .map_err(|e| Error::git_command_failed(format!("Failed to run git tag: {}", e)))?;

    if !status.success() {
        return Err(Error::git_command_failed(format!(
            "git tag -a {} failed (exit code {})",
            name,
            status.code().unwrap_or(1)
        ))
        .with_hint("An empty tag message aborts tag creation"));
    }

    Ok(GitOutput {
        action: "tag".to_string(),
        success: true,
        exit_code: 0,
        stdout: String::new(),
        stderr: String::new(),
    })
}

pub fn tag_exists_locally(path: &Path, tag_name: &str) -> bool {
    let reference = format!("refs/tags/{}", tag_name);
    command::succeeded_in(path, "git", &["rev-parse", "-q", "--verify", &reference])
}

pub fn tag_exists_on_remote(path: &Path, remote: &str, tag_name: &str) -> Result<bool> {
    let reference = format!("refs/tags/{}", tag_name);
    let stdout = git_stdout(path, &["ls-remote", "--tags", remote, &reference])?;
    Ok(!stdout.is_empty())
}

/// Delete a local tag. Returns false when there was nothing to delete.
pub fn delete_local_tag(path: &Path, tag_name: &str) -> Result<bool> {
    if !tag_exists_locally(path, tag_name) {
        return Ok(false);
    }
    run_git(path, "delete_tag", &["tag", "-d", tag_name])?;
    Ok(true)
}

/// Delete a tag on the remote. Returns false when the remote had no such tag.
pub fn delete_remote_tag(path: &Path, remote: &str, tag_name: &str) -> Result<bool> {
    if !tag_exists_on_remote(path, remote, tag_name)? {
        return Ok(false);
    }
    let refspec = format!(":refs/tags/{}", tag_name);
    match run_git(path, "delete_remote_tag", &["push", remote, &refspec]) {
        Ok(_) => Ok(true),
        Err(err) if err.message.contains("remote ref does not exist") => Ok(false),
        Err(err) => Err(err),
    }
}

/// Most recent tag reachable from HEAD, ignoring `exclude`.
/// Returns None when no such tag exists.
pub fn latest_tag_excluding(path: &Path, exclude: &str) -> Result<Option<String>> {
    let output = execute_git(
        path,
        &["describe", "--tags", "--abbrev=0", "--exclude", exclude, "HEAD"],
    )
    .map_err(|e| Error::git_command_failed(format!("Failed to run git describe: {}", e)))?;

    if !output.status.success() {
        return Ok(None);
    }

    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if tag.is_empty() { None } else { Some(tag) })
}

/// True when the tag is an annotated tag object rather than a lightweight ref.
pub fn is_annotated_tag(path: &Path, tag_name: &str) -> bool {
    let reference = format!("refs/tags/{}", tag_name);
    command::run_in_optional(path, "git", &["cat-file", "-t", &reference])
        .map(|kind| kind == "tag")
        .unwrap_or(false)
}

/// Annotation text of a tag, with any signature block removed.
pub fn tag_annotation(path: &Path, tag_name: &str) -> Result<String> {
    let reference = format!("refs/tags/{}", tag_name);
    let contents = git_stdout(path, &["for-each-ref", &reference, "--format=%(contents)"])?;
    Ok(strip_signature(&contents))
}

fn strip_signature(contents: &str) -> String {
    let end = SIGNATURE_MARKERS
        .iter()
        .filter_map(|marker| contents.find(marker))
        .min()
        .unwrap_or(contents.len());
    contents[..end].trim_end().to_string()
}
