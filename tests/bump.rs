mod common;

use std::cell::RefCell;

use common::TestRepo;
use foundry_release::bump::{self, BumpOptions, StepState};
use foundry_release::config::ReleaseConfig;
use foundry_release::error::Result;
use foundry_release::git::TagMessage;
use foundry_release::prompt::{PromptEngine, Prompter};

const NOTES: &str = "1.3.0 Koopa\n\n- level editor\n- fixed saves";

fn options(version: &str) -> BumpOptions {
    BumpOptions {
        version: Some(version.to_string()),
        notes: Some(TagMessage::Inline(NOTES.to_string())),
        dry_run: false,
    }
}

fn yes() -> PromptEngine {
    PromptEngine::with_interactive(false, true)
}

/// Answers questions from a script and says no to a chosen confirmation.
struct Scripted {
    answers: RefCell<Vec<String>>,
    decline_at: usize,
    asked: RefCell<usize>,
}

impl Prompter for Scripted {
    fn ask(&self, _question: &str) -> Result<String> {
        Ok(self.answers.borrow_mut().remove(0))
    }

    fn confirm(&self, _question: &str) -> Result<bool> {
        let mut asked = self.asked.borrow_mut();
        *asked += 1;
        Ok(*asked != self.decline_at)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[test]
fn same_version_exits_without_side_effects() {
    let repo = TestRepo::new("1.2.3");
    let before = repo.commit_count();

    let err = bump::run(repo.path(), &ReleaseConfig::default(), &options("1.2.3"), &yes()).unwrap_err();

    assert_eq!(err.code.as_str(), "bump.version_unchanged");
    assert_eq!(repo.read("VERSION"), "1.2.3\n");
    assert_eq!(repo.commit_count(), before);
    assert_eq!(repo.git(&["tag", "-l"]), "");
}

#[test]
fn new_version_writes_commits_tags_and_pushes() {
    let repo = TestRepo::new("1.2.3");

    let result = bump::run(repo.path(), &ReleaseConfig::default(), &options("1.3.0"), &yes()).unwrap();

    assert_eq!(result.old_version, "1.2.3");
    assert_eq!(result.new_version, "1.3.0");
    assert_eq!(repo.read("VERSION"), "1.3.0\n");
    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "version bump 1.3.0");

    let head = repo.head();
    assert_eq!(result.commit.as_deref(), Some(head.as_str()));
    assert_eq!(repo.git(&["rev-list", "-n", "1", "refs/tags/1.3.0"]), head);
    assert_eq!(repo.git(&["cat-file", "-t", "refs/tags/1.3.0"]), "tag");

    assert_eq!(repo.remote_git(&["rev-parse", "refs/heads/dev"]), head);
    assert_eq!(repo.remote_git(&["rev-list", "-n", "1", "refs/tags/1.3.0"]), head);
    assert!(result.warnings.is_empty());
}

#[test]
fn keyword_bumps_and_prompted_version() {
    let repo = TestRepo::new("1.2.3");
    let prompter = Scripted {
        answers: RefCell::new(vec!["minor".to_string()]),
        decline_at: usize::MAX,
        asked: RefCell::new(0),
    };
    let opts = BumpOptions {
        version: None,
        notes: Some(TagMessage::Inline(NOTES.to_string())),
        dry_run: false,
    };

    let result = bump::run(repo.path(), &ReleaseConfig::default(), &opts, &prompter).unwrap();
    assert_eq!(result.new_version, "1.3.0");
    assert_eq!(*prompter.asked.borrow(), 5);
}

#[test]
fn dry_run_plans_every_step_and_changes_nothing() {
    let repo = TestRepo::new("1.2.3");
    let before = repo.commit_count();
    let mut opts = options("1.3.0");
    opts.dry_run = true;

    let result = bump::run(repo.path(), &ReleaseConfig::default(), &opts, &yes()).unwrap();

    assert_eq!(result.steps.len(), 5);
    assert!(result.steps.iter().all(|s| matches!(s.state, StepState::Planned)));
    assert!(result.commit.is_none());
    assert_eq!(repo.read("VERSION"), "1.2.3\n");
    assert_eq!(repo.commit_count(), before);
}

#[test]
fn dry_run_still_rejects_no_op() {
    let repo = TestRepo::new("1.2.3");
    let mut opts = options("1.2.3");
    opts.dry_run = true;

    let err = bump::run(repo.path(), &ReleaseConfig::default(), &opts, &yes()).unwrap_err();
    assert_eq!(err.code.as_str(), "bump.version_unchanged");
}

#[test]
fn declining_a_step_stops_without_rollback() {
    let repo = TestRepo::new("1.2.3");
    let prompter = Scripted {
        answers: RefCell::new(Vec::new()),
        decline_at: 3,
        asked: RefCell::new(0),
    };

    let err = bump::run(repo.path(), &ReleaseConfig::default(), &options("1.3.0"), &prompter).unwrap_err();

    assert_eq!(err.code.as_str(), "bump.aborted");
    assert_eq!(err.details["step"], "tag");
    assert_eq!(err.details["completed"], serde_json::json!(["write_version", "commit"]));
    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "version bump 1.3.0");
    assert_eq!(repo.git(&["tag", "-l"]), "");
}

#[test]
fn existing_tag_fails_before_mutation() {
    let repo = TestRepo::new("1.2.3");
    repo.annotated_tag("1.3.0", "1.3.0 Early");

    let err = bump::run(repo.path(), &ReleaseConfig::default(), &options("1.3.0"), &yes()).unwrap_err();
    assert_eq!(err.code.as_str(), "validation.invalid_argument");
    assert_eq!(repo.read("VERSION"), "1.2.3\n");
}

#[test]
fn missing_notes_without_terminal_is_rejected() {
    let repo = TestRepo::new("1.2.3");
    let opts = BumpOptions {
        version: Some("1.3.0".to_string()),
        notes: None,
        dry_run: false,
    };

    let err = bump::run(repo.path(), &ReleaseConfig::default(), &opts, &yes()).unwrap_err();
    assert_eq!(err.code.as_str(), "validation.missing_argument");
    assert_eq!(repo.read("VERSION"), "1.2.3\n");
}

#[test]
fn annotation_without_version_prefix_warns() {
    let repo = TestRepo::new("1.2.3");
    let mut opts = options("1.3.0");
    opts.notes = Some(TagMessage::Inline("Koopa release".to_string()));

    let result = bump::run(repo.path(), &ReleaseConfig::default(), &opts, &yes()).unwrap();
    assert_eq!(result.warnings.len(), 1);
}
