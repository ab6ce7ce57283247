//! Step graph engine: ordering, readiness and batched parallel execution.
//!
//! Steps name their dependencies in `needs`. A step runs once every
//! dependency succeeded; if any dependency failed, was skipped or is
//! missing, the step is skipped. Independent ready steps run on their own
//! threads.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Hint, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, serde_json::Value>,
}

impl PipelineStep {
    pub fn new(id: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_type: step_type.into(),
            label: None,
            needs: Vec::new(),
            config: HashMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_needs(mut self, needs: Vec<String>) -> Self {
        self.needs = needs;
        self
    }

    pub fn with_config(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePlan {
    pub steps: Vec<PipelinePlanStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePlanStep {
    #[serde(flatten)]
    pub step: PipelineStep,
    pub status: PipelineStepStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStepStatus {
    Ready,
    Missing,
}

/// Decides whether a step can run in this environment.
pub trait PipelineCapabilityResolver: Send + Sync {
    /// Reasons the step cannot run here; empty when it can.
    fn missing(&self, step: &PipelineStep) -> Vec<String>;
}

pub trait PipelineStepExecutor: Send + Sync {
    fn execute_step(&self, step: &PipelineStep) -> Result<PipelineStepResult>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStepResult {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub status: PipelineRunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl PipelineStepResult {
    pub fn new(step: &PipelineStep, status: PipelineRunStatus) -> Self {
        Self {
            id: step.id.clone(),
            step_type: step.step_type.clone(),
            status,
            missing: Vec::new(),
            warnings: Vec::new(),
            hints: Vec::new(),
            data: None,
            error: None,
            error_code: None,
        }
    }

    pub fn success(step: &PipelineStep, data: serde_json::Value) -> Self {
        let mut result = Self::new(step, PipelineRunStatus::Success);
        result.data = Some(data);
        result
    }

    fn failed(step: &PipelineStep, err: &Error) -> Self {
        let mut result = Self::new(step, PipelineRunStatus::Failed);
        result.hints = err.hints.clone();
        result.error = Some(err.message.clone());
        result.error_code = Some(err.code.as_str().to_string());
        if !err.details.is_null() {
            result.data = Some(err.details.clone());
        }
        result
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunResult {
    pub steps: Vec<PipelineStepResult>,
    pub status: PipelineRunStatus,
    pub summary: PipelineRunSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub missing: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Success,
    PartialSuccess,
    Failed,
    Skipped,
    Missing,
}

pub fn plan(steps: &[PipelineStep], resolver: &dyn PipelineCapabilityResolver) -> Result<PipelinePlan> {
    let ordered = order_steps(steps)?;
    let steps = ordered
        .into_iter()
        .map(|step| {
            let missing = resolver.missing(&step);
            let status = if missing.is_empty() {
                PipelineStepStatus::Ready
            } else {
                PipelineStepStatus::Missing
            };
            PipelinePlanStep {
                step,
                status,
                missing,
            }
        })
        .collect();

    Ok(PipelinePlan { steps })
}

/// Kahn's algorithm. Rejects duplicate ids, unknown `needs` and cycles.
pub fn order_steps(steps: &[PipelineStep]) -> Result<Vec<PipelineStep>> {
    let mut id_index = HashMap::new();
    for (idx, step) in steps.iter().enumerate() {
        if id_index.insert(step.id.clone(), idx).is_some() {
            return Err(Error::validation_invalid_argument(
                "pipeline",
                format!("Duplicate step id '{}'", step.id),
                Some(step.id.clone()),
                None,
            ));
        }
    }

    let mut indegree = vec![0usize; steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (idx, step) in steps.iter().enumerate() {
        for need in &step.needs {
            match id_index.get(need) {
                Some(&parent_idx) => {
                    indegree[idx] += 1;
                    dependents[parent_idx].push(idx);
                }
                None => {
                    return Err(Error::validation_invalid_argument(
                        "pipeline",
                        format!("Step '{}' depends on unknown step '{}'", step.id, need),
                        Some(step.id.clone()),
                        None,
                    ));
                }
            }
        }
    }

    let mut queue: VecDeque<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut ordered = Vec::with_capacity(steps.len());
    while let Some(idx) = queue.pop_front() {
        ordered.push(steps[idx].clone());
        for &child in &dependents[idx] {
            indegree[child] -= 1;
            if indegree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if ordered.len() != steps.len() {
        let pending: Vec<String> = steps
            .iter()
            .enumerate()
            .filter(|(idx, _)| indegree[*idx] > 0)
            .map(|(_, step)| step.id.clone())
            .collect();
        return Err(Error::validation_invalid_argument(
            "pipeline",
            format!("Steps contain a cycle: {}", pending.join(", ")),
            None,
            Some(pending),
        ));
    }

    Ok(ordered)
}

pub fn run(
    steps: &[PipelineStep],
    executor: Arc<dyn PipelineStepExecutor>,
    resolver: Arc<dyn PipelineCapabilityResolver>,
) -> Result<PipelineRunResult> {
    let ordered = order_steps(steps)?;
    let mut results: Vec<PipelineStepResult> = Vec::with_capacity(ordered.len());
    let mut pending_steps: Vec<PipelineStep> = Vec::new();

    for step in ordered {
        let missing = resolver.missing(&step);
        if missing.is_empty() {
            pending_steps.push(step);
        } else {
            log_status!("pipeline", "{}: missing ({})", step.id, missing.join("; "));
            let mut result = PipelineStepResult::new(&step, PipelineRunStatus::Missing);
            result.missing = missing;
            results.push(result);
        }
    }

    while !pending_steps.is_empty() {
        let (ready, blocked, skipped) = split_ready_steps(&pending_steps, &results);
        results.extend(skipped);

        if ready.is_empty() {
            if blocked.is_empty() {
                break;
            }
            return Err(Error::internal_unexpected(format!(
                "Steps blocked with no runnable dependency: {}",
                blocked.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }

        results.extend(execute_batch(&ready, Arc::clone(&executor))?);
        pending_steps = blocked;
    }

    let status = derive_overall_status(&results);
    let summary = build_summary(&results, status);

    Ok(PipelineRunResult {
        steps: results,
        status,
        summary,
    })
}

/// Run one step in isolation, ignoring its `needs`.
pub fn run_single(
    step: &PipelineStep,
    executor: &dyn PipelineStepExecutor,
    resolver: &dyn PipelineCapabilityResolver,
) -> PipelineStepResult {
    let missing = resolver.missing(step);
    if !missing.is_empty() {
        let mut result = PipelineStepResult::new(step, PipelineRunStatus::Missing);
        result.missing = missing;
        return result;
    }
    execute_single_step(step, executor)
}

fn split_ready_steps(
    pending: &[PipelineStep],
    results: &[PipelineStepResult],
) -> (Vec<PipelineStep>, Vec<PipelineStep>, Vec<PipelineStepResult>) {
    let mut ready = Vec::new();
    let mut blocked = Vec::new();
    let mut skipped = Vec::new();

    let mut status_map: HashMap<String, PipelineRunStatus> = results
        .iter()
        .map(|result| (result.id.clone(), result.status))
        .collect();

    for step in pending {
        let mut unmet = false;
        let mut failed_dependency: Option<&str> = None;

        for need in &step.needs {
            match status_map.get(need) {
                Some(PipelineRunStatus::Success) => {}
                Some(_) => {
                    failed_dependency = Some(need);
                    break;
                }
                None => unmet = true,
            }
        }

        if let Some(dep) = failed_dependency {
            log_status!("pipeline", "{}: skipped ('{}' did not succeed)", step.id, dep);
            let mut result = PipelineStepResult::new(step, PipelineRunStatus::Skipped);
            result
                .warnings
                .push(format!("Skipped because '{}' did not succeed", dep));
            status_map.insert(step.id.clone(), PipelineRunStatus::Skipped);
            skipped.push(result);
        } else if unmet {
            blocked.push(step.clone());
        } else {
            ready.push(step.clone());
        }
    }

    (ready, blocked, skipped)
}

fn derive_overall_status(results: &[PipelineStepResult]) -> PipelineRunStatus {
    let count = |status: PipelineRunStatus| results.iter().filter(|r| r.status == status).count();
    let succeeded = count(PipelineRunStatus::Success);

    if succeeded == results.len() {
        return PipelineRunStatus::Success;
    }
    if count(PipelineRunStatus::Failed) > 0 {
        return if succeeded > 0 {
            PipelineRunStatus::PartialSuccess
        } else {
            PipelineRunStatus::Failed
        };
    }
    if count(PipelineRunStatus::Missing) > 0 {
        return if succeeded > 0 {
            PipelineRunStatus::PartialSuccess
        } else {
            PipelineRunStatus::Missing
        };
    }
    PipelineRunStatus::Skipped
}

fn build_summary(results: &[PipelineStepResult], status: PipelineRunStatus) -> PipelineRunSummary {
    let count = |status: PipelineRunStatus| results.iter().filter(|r| r.status == status).count();

    let next_actions = match status {
        PipelineRunStatus::PartialSuccess | PipelineRunStatus::Failed => {
            vec!["Fix the failing step and re-run the pipeline".to_string()]
        }
        PipelineRunStatus::Missing => {
            vec!["Run missing builds on their target OS, or pass --any-host".to_string()]
        }
        _ => Vec::new(),
    };

    PipelineRunSummary {
        total_steps: results.len(),
        succeeded: count(PipelineRunStatus::Success),
        failed: count(PipelineRunStatus::Failed),
        skipped: count(PipelineRunStatus::Skipped),
        missing: count(PipelineRunStatus::Missing),
        next_actions,
    }
}

fn execute_batch(
    steps: &[PipelineStep],
    executor: Arc<dyn PipelineStepExecutor>,
) -> Result<Vec<PipelineStepResult>> {
    if let [step] = steps {
        return Ok(vec![execute_single_step(step, executor.as_ref())]);
    }

    let handles: Vec<_> = steps
        .iter()
        .map(|step| {
            let step = step.clone();
            let executor = Arc::clone(&executor);
            thread::spawn(move || execute_single_step(&step, executor.as_ref()))
        })
        .collect();

    let mut results = Vec::with_capacity(steps.len());
    for handle in handles {
        results.push(
            handle
                .join()
                .map_err(|_| Error::internal_unexpected("Step execution thread panicked"))?,
        );
    }

    Ok(results)
}

fn execute_single_step(step: &PipelineStep, executor: &dyn PipelineStepExecutor) -> PipelineStepResult {
    log_status!("pipeline", "{}: running", step.id);
    match executor.execute_step(step) {
        Ok(mut result) => {
            if result.status == PipelineRunStatus::Success {
                result.missing = Vec::new();
                result.error = None;
                result.error_code = None;
            }
            result
        }
        Err(err) => {
            log_status!("pipeline", "{}: failed: {}", step.id, err.message);
            PipelineStepResult::failed(step, &err)
        }
    }
}
