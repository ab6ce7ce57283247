mod common;

use std::sync::Arc;

use common::{FakeHost, TestRepo, DEFAULT_ARTIFACTS};
use foundry_release::config::ReleaseConfig;
use foundry_release::hosting::ReleaseHost;
use foundry_release::pipeline::{PipelineRunStatus, PipelineStepStatus};
use foundry_release::release::{self, ReleaseOptions};
use foundry_release::trigger::{Trigger, TriggerEvent};

const ANNOTATION: &str = "1.3.0 Koopa\n\n- level editor\n- fixed saves";

/// Gates that always pass and builds that write a file per platform.
fn local_config() -> ReleaseConfig {
    let mut config = ReleaseConfig::default();
    config.gates.style = "true".to_string();
    config.gates.analysis = "true".to_string();
    for platform in &mut config.platforms {
        platform.build_command =
            "mkdir -p dist/{{platform}} && printf built > dist/{{platform}}/{{app_name}}{{suffix}}".to_string();
        platform.output = "dist/{{platform}}/{{app_name}}{{suffix}}".to_string();
    }
    config
}

fn any_host() -> ReleaseOptions {
    ReleaseOptions { any_host: true }
}

fn step_ids(plan: &release::ReleasePlan) -> Vec<&str> {
    plan.steps.iter().map(|s| s.step.id.as_str()).collect()
}

fn status_of(run: &release::ReleaseRun, id: &str) -> PipelineRunStatus {
    run.result
        .steps
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.status)
        .unwrap_or_else(|| panic!("no step '{}'", id))
}

#[test]
fn pull_request_plans_only_gates() {
    let trigger = Trigger::new(TriggerEvent::PullRequest, "refs/heads/dev");
    let plan = release::plan(&local_config(), &trigger, &any_host()).unwrap();

    assert_eq!(step_ids(&plan), vec!["check.style", "check.analysis"]);
}

#[test]
fn dev_push_plans_nightly_after_gates() {
    let trigger = Trigger::new(TriggerEvent::Push, "refs/heads/dev");
    let plan = release::plan(&local_config(), &trigger, &any_host()).unwrap();

    assert_eq!(step_ids(&plan), vec!["check.style", "check.analysis", "nightly"]);
    assert_eq!(plan.steps[2].step.needs, vec!["check.style", "check.analysis"]);
}

#[test]
fn tag_push_plans_builds_then_publish() {
    let trigger = Trigger::new(TriggerEvent::Push, "refs/tags/1.3.0");
    let config = local_config();

    let plan = release::plan(&config, &trigger, &any_host()).unwrap();
    let ids = step_ids(&plan);
    assert_eq!(ids.len(), 6);
    assert_eq!(ids.last(), Some(&"publish"));
    assert!(plan.steps.iter().all(|s| s.status == PipelineStepStatus::Ready));

    let publish = &plan.steps[5].step;
    assert_eq!(publish.needs, vec!["build.linux", "build.win64", "build.osx"]);

    let local = release::plan(&config, &trigger, &ReleaseOptions::default()).unwrap();
    let missing = local
        .steps
        .iter()
        .filter(|s| s.status == PipelineStepStatus::Missing)
        .count();
    assert_eq!(missing, 2);
}

#[test]
fn failed_build_skips_publish() {
    let repo = TestRepo::new("1.3.0");
    repo.annotated_tag("1.3.0", ANNOTATION);
    let mut config = local_config();
    config.platforms[1].build_command = "echo 'packager crashed' >&2; exit 3".to_string();
    let host = Arc::new(FakeHost::new());
    let shared: Arc<dyn ReleaseHost> = host.clone();

    let trigger = Trigger::new(TriggerEvent::Push, "refs/tags/1.3.0");
    let run = release::run(repo.path(), &config, &trigger, &any_host(), Some(shared)).unwrap();

    assert_eq!(status_of(&run, "build.linux"), PipelineRunStatus::Success);
    assert_eq!(status_of(&run, "build.win64"), PipelineRunStatus::Failed);
    assert_eq!(status_of(&run, "publish"), PipelineRunStatus::Skipped);
    assert_eq!(run.result.status, PipelineRunStatus::PartialSuccess);
    assert!(host.releases_for("1.3.0").is_empty());

    let failed = run.result.steps.iter().find(|s| s.id == "build.win64").unwrap();
    assert_eq!(failed.error_code.as_deref(), Some("build.failed"));
}

#[test]
fn foreign_builds_are_missing_and_publish_is_skipped() {
    let repo = TestRepo::new("1.3.0");
    repo.annotated_tag("1.3.0", ANNOTATION);
    let host = Arc::new(FakeHost::new());
    let shared: Arc<dyn ReleaseHost> = host.clone();

    let trigger = Trigger::new(TriggerEvent::Push, "refs/tags/1.3.0");
    let run = release::run(
        repo.path(),
        &local_config(),
        &trigger,
        &ReleaseOptions::default(),
        Some(shared),
    )
    .unwrap();

    let missing = run
        .result
        .steps
        .iter()
        .filter(|s| s.status == PipelineRunStatus::Missing)
        .count();
    assert_eq!(missing, 2);
    assert_eq!(status_of(&run, "publish"), PipelineRunStatus::Skipped);
    assert!(host.releases_for("1.3.0").is_empty());
}

#[test]
fn failing_gate_blocks_nightly() {
    let repo = TestRepo::new("1.2.3");
    let mut config = local_config();
    config.gates.style = "exit 1".to_string();

    let trigger = Trigger::new(TriggerEvent::Push, "refs/heads/dev");
    let run = release::run(repo.path(), &config, &trigger, &any_host(), None).unwrap();

    assert_eq!(status_of(&run, "check.style"), PipelineRunStatus::Failed);
    assert_eq!(status_of(&run, "check.analysis"), PipelineRunStatus::Success);
    assert_eq!(status_of(&run, "nightly"), PipelineRunStatus::Skipped);
    assert_eq!(repo.remote_git(&["tag", "-l", "nightly"]), "");
}

#[test]
fn dev_push_rotates_nightly() {
    let repo = TestRepo::new("1.2.3");
    repo.annotated_tag("1.2.3", "1.2.3 Goomba");
    repo.commit("levels.txt", "one\n", "add level view");

    let trigger = Trigger::new(TriggerEvent::Push, "refs/heads/dev");
    let run = release::run(repo.path(), &local_config(), &trigger, &any_host(), None).unwrap();

    assert_eq!(run.result.status, PipelineRunStatus::Success);
    assert_eq!(repo.remote_git(&["rev-parse", "refs/tags/nightly^{commit}"]), repo.head());
}

#[test]
fn tag_push_publishes_every_platform() {
    let repo = TestRepo::new("1.3.0");
    repo.annotated_tag("1.3.0", ANNOTATION);
    let host = Arc::new(FakeHost::new());
    let shared: Arc<dyn ReleaseHost> = host.clone();

    let trigger = Trigger::new(TriggerEvent::Push, "refs/tags/1.3.0");
    let run = release::run(repo.path(), &local_config(), &trigger, &any_host(), Some(shared)).unwrap();

    assert_eq!(run.result.status, PipelineRunStatus::Success);
    assert_eq!(run.result.summary.succeeded, 6);

    let releases = host.releases_for("1.3.0");
    assert_eq!(releases.len(), 1);
    assert!(!releases[0].prerelease);
    let mut names: Vec<&str> = releases[0].assets.iter().map(|a| a.name.as_str()).collect();
    names.sort();
    let mut expected = DEFAULT_ARTIFACTS.to_vec();
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn single_step_ignores_needs() {
    let repo = TestRepo::new("1.3.0");
    let trigger = Trigger::new(TriggerEvent::Push, "refs/tags/1.3.0");

    let run = release::run_step(repo.path(), &local_config(), &trigger, "build.osx", &any_host(), None).unwrap();

    assert_eq!(run.step.status, PipelineRunStatus::Success);
    assert!(repo.path().join("dist/release/osx-smb3-foundry").is_file());
}

#[test]
fn unknown_step_is_rejected() {
    let repo = TestRepo::new("1.3.0");
    let trigger = Trigger::new(TriggerEvent::PullRequest, "refs/heads/dev");

    let err = release::run_step(repo.path(), &local_config(), &trigger, "publish", &any_host(), None).unwrap_err();
    assert_eq!(err.code.as_str(), "validation.invalid_argument");
}
