//! Nightly tag rotation.
//!
//! The floating `nightly` tag is recomputed from scratch on every run: it
//! always points at HEAD of the dev branch and its annotation lists the
//! non-merge commits since the last real release tag.

use std::path::Path;

use serde::Serialize;

use crate::config::{ReleaseConfig, RotationStrategy};
use crate::error::{Error, Result};
use crate::git::{self, LogEntry, TagMessage};
use crate::trigger::BRANCH_REF_PREFIX;

#[derive(Debug, Clone, Default)]
pub struct NightlyOptions {
    /// Branch ref the rotation was triggered for; the checkout is used when absent.
    pub git_ref: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NightlyResult {
    pub tag: String,
    pub branch: String,
    pub head: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_tag: Option<String>,
    /// Revision the count starts from: the last release tag, else the root commit.
    pub since: String,
    pub commit_count: u64,
    pub annotation: String,
    pub strategy: RotationStrategy,
    pub dry_run: bool,
    pub deleted_local: bool,
    pub deleted_remote: bool,
    pub pushed: bool,
}

/// Annotation text. No timestamps, so the same inputs give the same text.
pub fn build_annotation(count: u64, since: &str, entries: &[LogEntry]) -> String {
    let noun = if count == 1 { "commit" } else { "commits" };
    let mut text = format!("Nightly build: {} {} since {}\n", count, noun, since);

    if !entries.is_empty() {
        text.push('\n');
        for entry in entries {
            text.push_str(&format!("- {} {}\n", entry.sha, entry.subject));
        }
    }

    text
}

fn resolve_branch(root: &Path, git_ref: Option<&str>) -> Result<String> {
    match git_ref {
        Some(r) => r
            .strip_prefix(BRANCH_REF_PREFIX)
            .map(|b| b.to_string())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "ref",
                    format!("'{}' is not a branch ref", r),
                    Some(r.to_string()),
                    None,
                )
            }),
        None => git::current_branch(root),
    }
}

pub fn rotate(root: &Path, config: &ReleaseConfig, options: &NightlyOptions) -> Result<NightlyResult> {
    git::require_git_repo(root)?;

    let branch = resolve_branch(root, options.git_ref.as_deref())?;
    if !branch.starts_with(&config.branches.dev) {
        return Err(Error::validation_invalid_argument(
            "branch",
            format!(
                "Nightly rotation only runs on '{}' branches (current: '{}')",
                config.branches.dev, branch
            ),
            Some(branch.clone()),
            None,
        ));
    }

    let tag = config.nightly.tag.as_str();
    let head = git::get_head_commit(root)?;
    let since_tag = git::latest_tag_excluding(root, tag)?;
    let since = match &since_tag {
        Some(last) => last.clone(),
        None => git::root_commit(root)?,
    };
    let range = format!("{}..HEAD", since);

    let commit_count = git::count_commits(root, &range)?;
    let entries = git::log_without_merges(root, &range)?;
    let since_label = match &since_tag {
        Some(last) => last.as_str(),
        None => &since[..since.len().min(7)],
    };
    let annotation = build_annotation(commit_count, since_label, &entries);

    let mut result = NightlyResult {
        tag: tag.to_string(),
        branch,
        head,
        since_tag,
        since,
        commit_count,
        annotation,
        strategy: config.nightly.strategy,
        dry_run: options.dry_run,
        deleted_local: false,
        deleted_remote: false,
        pushed: false,
    };

    if options.dry_run {
        return Ok(result);
    }

    result.deleted_local = git::delete_local_tag(root, tag)?;
    if config.nightly.strategy == RotationStrategy::DeleteThenCreate {
        result.deleted_remote = git::delete_remote_tag(root, &config.remote, tag)?;
    }

    git::create_annotated_tag(root, tag, &TagMessage::Inline(result.annotation.clone()))?;
    git::push_tag(root, &config.remote, tag, true)?;
    result.pushed = true;

    log_status!(
        "nightly",
        "'{}' now points at {} ({} commits since {})",
        tag,
        &result.head[..result.head.len().min(8)],
        result.commit_count,
        result.since_tag.as_deref().unwrap_or(&result.since)
    );

    Ok(result)
}
