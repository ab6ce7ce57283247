//! Version bump & tag procedure.
//!
//! write version file -> commit -> annotated tag -> push branch -> push tag.
//! Each step waits for operator confirmation. The first failure aborts the
//! run and earlier steps are left in place.

use std::path::Path;

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git::{self, TagMessage};
use crate::prompt::Prompter;
use crate::version;

pub const COMMIT_MESSAGE_PREFIX: &str = "version bump";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpStep {
    WriteVersion,
    Commit,
    Tag,
    PushBranch,
    PushTag,
}

impl BumpStep {
    pub const ALL: [BumpStep; 5] = [
        BumpStep::WriteVersion,
        BumpStep::Commit,
        BumpStep::Tag,
        BumpStep::PushBranch,
        BumpStep::PushTag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpStep::WriteVersion => "write_version",
            BumpStep::Commit => "commit",
            BumpStep::Tag => "tag",
            BumpStep::PushBranch => "push_branch",
            BumpStep::PushTag => "push_tag",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BumpOptions {
    /// Explicit version or `patch`/`minor`/`major`. Prompted for when absent.
    pub version: Option<String>,
    /// Tag message. Falls back to the editor on a terminal.
    pub notes: Option<TagMessage>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Planned,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct BumpStepOutcome {
    pub step: BumpStep,
    pub description: String,
    pub state: StepState,
}

#[derive(Debug, Clone, Serialize)]
pub struct BumpResult {
    pub old_version: String,
    pub new_version: String,
    pub tag: String,
    pub commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub branch: String,
    pub remote: String,
    pub dry_run: bool,
    pub steps: Vec<BumpStepOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

pub fn commit_message(version: &str) -> String {
    format!("{} {}", COMMIT_MESSAGE_PREFIX, version)
}

struct BumpPlan<'a> {
    root: &'a Path,
    config: &'a ReleaseConfig,
    new_version: String,
    branch: String,
    message: TagMessage,
}

impl BumpPlan<'_> {
    fn describe(&self, step: BumpStep) -> String {
        match step {
            BumpStep::WriteVersion => {
                format!("Write '{}' to {}", self.new_version, self.config.version_file)
            }
            BumpStep::Commit => format!("Commit '{}'", commit_message(&self.new_version)),
            BumpStep::Tag => format!("Create annotated tag '{}'", self.new_version),
            BumpStep::PushBranch => {
                format!("Push branch '{}' to '{}'", self.branch, self.config.remote)
            }
            BumpStep::PushTag => {
                format!("Push tag '{}' to '{}'", self.new_version, self.config.remote)
            }
        }
    }

    fn execute(&self, step: BumpStep) -> Result<()> {
        match step {
            BumpStep::WriteVersion => {
                version::write_version_file(&self.config.version_path(self.root), &self.new_version)
            }
            BumpStep::Commit => git::commit_paths(
                self.root,
                &commit_message(&self.new_version),
                &[self.config.version_file.as_str()],
            )
            .map(|_| ()),
            BumpStep::Tag => {
                git::create_annotated_tag(self.root, &self.new_version, &self.message).map(|_| ())
            }
            BumpStep::PushBranch => {
                git::push_branch(self.root, &self.config.remote, &self.branch).map(|_| ())
            }
            BumpStep::PushTag => {
                git::push_tag(self.root, &self.config.remote, &self.new_version, false).map(|_| ())
            }
        }
    }
}

/// Run the bump procedure against the repository at `root`.
pub fn run(
    root: &Path,
    config: &ReleaseConfig,
    options: &BumpOptions,
    prompter: &dyn Prompter,
) -> Result<BumpResult> {
    let current = version::read_version_file(&config.version_path(root))?;

    let requested = match &options.version {
        Some(v) => v.clone(),
        None => prompter.ask(&format!(
            "What should the new version be (current: '{}')?",
            current
        ))?,
    };
    let new_version = version::resolve_requested(&current, &requested)?;

    // No-op is rejected before anything else touches the repository.
    if new_version == current {
        return Err(Error::version_unchanged(current));
    }
    log_status!("bump", "New version chosen: '{}'", new_version);

    git::require_git_repo(root)?;
    let branch = git::current_branch(root)?;

    if git::tag_exists_locally(root, &new_version) {
        return Err(Error::validation_invalid_argument(
            "version",
            format!("Tag '{}' already exists", new_version),
            Some(new_version.clone()),
            None,
        )
        .with_hint(format!("Delete it first: git tag -d {}", new_version)));
    }

    let message = if options.dry_run {
        options.notes.clone().unwrap_or(TagMessage::Editor)
    } else {
        resolve_message(options, prompter)?
    };
    let plan = BumpPlan {
        root,
        config,
        new_version: new_version.clone(),
        branch: branch.clone(),
        message,
    };

    let mut warnings = version::bump_warnings(&current, &new_version);
    if !git::is_workdir_clean(root) {
        warnings.push(format!(
            "Working tree has other changes; only {} is committed",
            config.version_file
        ));
    }
    let mut steps = Vec::with_capacity(BumpStep::ALL.len());

    if options.dry_run {
        for step in BumpStep::ALL {
            steps.push(BumpStepOutcome {
                step,
                description: plan.describe(step),
                state: StepState::Planned,
            });
        }
    } else {
        for step in BumpStep::ALL {
            let description = plan.describe(step);
            if !prompter.confirm(&format!("{}?", description))? {
                return Err(with_progress(Error::bump_aborted(step.as_str()), &steps));
            }

            log_status!("bump", "{}", description);
            plan.execute(step).map_err(|e| with_progress(e, &steps))?;

            steps.push(BumpStepOutcome {
                step,
                description,
                state: StepState::Done,
            });
        }

        if let Some(warning) = check_annotation(root, &new_version)? {
            warnings.push(warning);
        }
    }

    let commit = if options.dry_run {
        None
    } else {
        Some(git::get_head_commit(root)?)
    };

    Ok(BumpResult {
        old_version: current,
        commit_message: commit_message(&new_version),
        tag: new_version.clone(),
        new_version: new_version.clone(),
        commit,
        hints: next_steps(config, &branch, &new_version),
        branch,
        remote: config.remote.clone(),
        dry_run: options.dry_run,
        steps,
        warnings,
    })
}

fn resolve_message(options: &BumpOptions, prompter: &dyn Prompter) -> Result<TagMessage> {
    match &options.notes {
        Some(message) => Ok(message.clone()),
        None if prompter.is_interactive() => Ok(TagMessage::Editor),
        None => Err(Error::validation_missing_argument(vec!["notes".to_string()])
            .with_hint("Pass --notes or --notes-file when not running in a terminal")),
    }
}

fn with_progress(mut err: Error, completed: &[BumpStepOutcome]) -> Error {
    if completed.is_empty() {
        return err;
    }
    let done: Vec<&str> = completed.iter().map(|s| s.step.as_str()).collect();
    if let Some(obj) = err.details.as_object_mut() {
        obj.insert("completed".to_string(), serde_json::json!(done));
    }
    err.with_hint(format!(
        "Completed before stopping (not rolled back): {}",
        done.join(", ")
    ))
}

/// Warn when the annotation does not open with the version number.
fn check_annotation(root: &Path, tag: &str) -> Result<Option<String>> {
    let annotation = git::tag_annotation(root, tag)?;
    let first_line = annotation.lines().next().unwrap_or("");
    if first_line.starts_with(tag) {
        Ok(None)
    } else {
        Ok(Some(format!(
            "Tag annotation should start with '{} <codename>', found '{}'",
            tag, first_line
        )))
    }
}

fn next_steps(config: &ReleaseConfig, branch: &str, version: &str) -> Vec<String> {
    let mut hints = Vec::new();
    if branch.starts_with(&config.branches.dev) {
        hints.push(format!(
            "Merge '{}' into '{}' to publish this release from the release branch",
            branch, config.branches.release
        ));
    }
    hints.push(format!(
        "Tag annotations read '{} Some codename', an empty line, then the change notes",
        version
    ));
    hints
}
