//! GitHub Actions workflow generated from the release config.
//!
//! Every job shells out to `foundry-release pipeline step <id>`, so the
//! workflow only wires triggers, runners and artifact hand-off.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::gates::Gate;
use crate::utils::io;

const CHECKOUT: &str = "actions/checkout@v4";
const SETUP_PYTHON: &str = "actions/setup-python@v5";
const UPLOAD_ARTIFACT: &str = "actions/upload-artifact@v4";
const DOWNLOAD_ARTIFACT: &str = "actions/download-artifact@v4";
const GATE_RUNNER: &str = "ubuntu-latest";

#[derive(Debug, Serialize)]
struct Workflow {
    name: String,
    on: Triggers,
    jobs: Jobs,
}

#[derive(Debug, Serialize)]
struct Triggers {
    push: PushTrigger,
    pull_request: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PushTrigger {
    branches: Vec<String>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Jobs {
    style: Job,
    analysis: Job,
    nightly: Job,
    build: Job,
    publish: Job,
}

#[derive(Debug, Serialize)]
struct Job {
    name: String,
    #[serde(rename = "runs-on")]
    runs_on: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    needs: Vec<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    permissions: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
struct Strategy {
    #[serde(rename = "fail-fast")]
    fail_fast: bool,
    matrix: Matrix,
}

#[derive(Debug, Serialize)]
struct Matrix {
    include: Vec<MatrixEntry>,
}

#[derive(Debug, Serialize)]
struct MatrixEntry {
    platform: String,
    os: String,
    artifact: String,
}

#[derive(Debug, Default, Serialize)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    with: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
}

impl Step {
    fn uses(action: &str) -> Self {
        Self {
            uses: Some(action.to_string()),
            ..Default::default()
        }
    }

    fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            run: Some(command.into()),
            ..Default::default()
        }
    }

    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.with.insert(key.to_string(), value.into());
        self
    }

    fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
    pub jobs: Vec<String>,
}

fn secret(name: &str) -> String {
    format!("${{{{ secrets.{} }}}}", name)
}

fn step_command(step_id: &str) -> String {
    format!("foundry-release pipeline step {}", step_id)
}

/// Checkout with full history (nightly needs `git describe`) plus the
/// configured toolchain setup.
fn setup_steps(config: &ReleaseConfig) -> Vec<Step> {
    setup_steps_from(config, Step::uses(CHECKOUT).with("fetch-depth", "0"))
}

fn setup_steps_from(config: &ReleaseConfig, checkout: Step) -> Vec<Step> {
    let mut steps = vec![checkout];
    if let Some(python) = &config.workflow.python_version {
        steps.push(Step::uses(SETUP_PYTHON).with("python-version", python.as_str()));
    }
    for (idx, command) in config.workflow.setup.iter().enumerate() {
        steps.push(Step::run(format!("Setup {}", idx + 1), command.as_str()));
    }
    steps
}

fn gate_job(config: &ReleaseConfig, gate: Gate) -> Job {
    let mut steps = setup_steps(config);
    steps.push(Step::run(gate.command(config), step_command(&gate.step_id())));
    Job {
        name: gate.step_id(),
        runs_on: GATE_RUNNER.to_string(),
        needs: Vec::new(),
        condition: None,
        permissions: BTreeMap::new(),
        strategy: None,
        steps,
    }
}

fn gate_needs() -> Vec<String> {
    Gate::ALL.iter().map(|g| g.as_str().to_string()).collect()
}

fn write_permissions() -> BTreeMap<String, String> {
    BTreeMap::from([("contents".to_string(), "write".to_string())])
}

/// The nightly tag push has to start the tag-triggered publish run, so the
/// checkout credentials come from `workflow.push_token_secret`.
fn nightly_job(config: &ReleaseConfig) -> Job {
    let checkout = Step::uses(CHECKOUT)
        .with("fetch-depth", "0")
        .with("token", secret(&config.workflow.push_token_secret));
    let mut steps = setup_steps_from(config, checkout);
    steps.push(Step::run(
        "Configure git identity",
        format!(
            "git config user.name \"{}\" && git config user.email \"{}\"",
            config.workflow.git_user_name, config.workflow.git_user_email
        ),
    ));
    steps.push(Step::run(
        format!("Rotate {}", config.nightly.tag),
        step_command("nightly"),
    ));
    Job {
        name: "nightly".to_string(),
        runs_on: GATE_RUNNER.to_string(),
        needs: gate_needs(),
        condition: Some(format!(
            "github.event_name == 'push' && startsWith(github.ref, '{}')",
            config.dev_ref_prefix()
        )),
        permissions: write_permissions(),
        strategy: None,
        steps,
    }
}

fn build_job(config: &ReleaseConfig) -> Job {
    let include = config
        .platforms
        .iter()
        .map(|p| MatrixEntry {
            platform: p.prefix.clone(),
            os: p.runner.clone(),
            artifact: p.artifact_name(&config.app_name),
        })
        .collect();

    let mut steps = setup_steps(config);
    steps.push(Step::run(
        "Build ${{ matrix.artifact }}",
        step_command("build.${{ matrix.platform }}"),
    ));
    steps.push(
        Step::uses(UPLOAD_ARTIFACT)
            .with("name", "${{ matrix.artifact }}")
            .with("path", format!("{}/${{{{ matrix.artifact }}}}", config.artifact_dir))
            .with("if-no-files-found", "error"),
    );

    Job {
        name: "build ${{ matrix.platform }}".to_string(),
        runs_on: "${{ matrix.os }}".to_string(),
        needs: gate_needs(),
        condition: Some("github.event_name == 'push' && startsWith(github.ref, 'refs/tags/')".to_string()),
        permissions: BTreeMap::new(),
        strategy: Some(Strategy {
            fail_fast: true,
            matrix: Matrix { include },
        }),
        steps,
    }
}

fn publish_job(config: &ReleaseConfig) -> Job {
    let mut steps = setup_steps(config);
    steps.push(
        Step::uses(DOWNLOAD_ARTIFACT)
            .with("path", config.artifact_dir.as_str())
            .with("merge-multiple", "true"),
    );
    steps.push(
        Step::run("Publish release", step_command("publish"))
            .env(&config.publish.token_env, secret("GITHUB_TOKEN")),
    );

    Job {
        name: "publish".to_string(),
        runs_on: GATE_RUNNER.to_string(),
        needs: vec!["build".to_string()],
        condition: Some("github.event_name == 'push' && startsWith(github.ref, 'refs/tags/')".to_string()),
        permissions: write_permissions(),
        strategy: None,
        steps,
    }
}

pub fn render(config: &ReleaseConfig) -> Result<String> {
    let workflow = Workflow {
        name: config.workflow.name.clone(),
        on: Triggers {
            push: PushTrigger {
                branches: vec![
                    format!("{}*", config.branches.dev),
                    config.branches.release.clone(),
                ],
                tags: vec!["*".to_string()],
            },
            pull_request: BTreeMap::new(),
        },
        jobs: Jobs {
            style: gate_job(config, Gate::Style),
            analysis: gate_job(config, Gate::Analysis),
            nightly: nightly_job(config),
            build: build_job(config),
            publish: publish_job(config),
        },
    };

    serde_yml::to_string(&workflow)
        .map_err(|e| Error::internal_unexpected(format!("Failed to render workflow YAML: {}", e)))
}

/// Render the workflow, writing it to `output` (relative to `root`) when given.
pub fn generate(root: &Path, config: &ReleaseConfig, output: Option<&Path>) -> Result<WorkflowOutput> {
    let yaml = render(config)?;
    let jobs = ["style", "analysis", "nightly", "build", "publish"]
        .iter()
        .map(|j| j.to_string())
        .collect();

    match output {
        Some(path) => {
            let path = root.join(path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
                })?;
            }
            io::write_file_atomic(&path, &yaml, &format!("write {}", path.display()))?;
            log_status!("workflow", "Wrote {}", path.display());
            Ok(WorkflowOutput {
                path: Some(path),
                yaml: None,
                jobs,
            })
        }
        None => Ok(WorkflowOutput {
            path: None,
            yaml: Some(yaml),
            jobs,
        }),
    }
}
