use std::path::Path;
use std::sync::Arc;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::gates::Gate;
use crate::hosting::ReleaseHost;
use crate::matrix::HostOs;
use crate::pipeline::{self, PipelineStep};
use crate::trigger::Trigger;

use super::executor::ReleaseStepExecutor;
use super::resolver::ReleaseCapabilityResolver;
use super::types::{
    ReleaseOptions, ReleasePlan, ReleaseRun, ReleaseStepRun, ReleaseStepType, NIGHTLY_STEP,
    PUBLISH_STEP,
};

/// Release graph for a trigger.
///
/// - every trigger runs the style and analysis gates
/// - a push to a dev-prefixed branch rotates the nightly tag
/// - a tag push builds every platform, then publishes once all builds succeed
/// - pull requests only run the gates
pub fn steps_for(trigger: &Trigger, config: &ReleaseConfig) -> Vec<PipelineStep> {
    let gate_ids: Vec<String> = Gate::ALL.iter().map(|g| g.step_id()).collect();
    let mut steps: Vec<PipelineStep> = Gate::ALL
        .iter()
        .map(|gate| {
            PipelineStep::new(gate.step_id(), ReleaseStepType::Check(*gate).as_str())
                .with_label(gate.command(config))
        })
        .collect();

    if trigger.is_branch_push_with_prefix(&config.branches.dev) {
        steps.push(
            PipelineStep::new(NIGHTLY_STEP, ReleaseStepType::Nightly.as_str())
                .with_label(format!("Rotate '{}' tag", config.nightly.tag))
                .with_needs(gate_ids.clone()),
        );
    }

    if trigger.is_tag_push() {
        let mut build_ids = Vec::with_capacity(config.platforms.len());
        for platform in &config.platforms {
            let id = platform.step_id();
            build_ids.push(id.clone());
            steps.push(
                PipelineStep::new(id, ReleaseStepType::Build.as_str())
                    .with_label(platform.artifact_name(&config.app_name))
                    .with_needs(gate_ids.clone())
                    .with_config("platform", platform.prefix.as_str()),
            );
        }
        steps.push(
            PipelineStep::new(PUBLISH_STEP, ReleaseStepType::Publish.as_str())
                .with_label(trigger.tag().unwrap_or_default().to_string())
                .with_needs(build_ids),
        );
    }

    steps
}

pub fn plan(config: &ReleaseConfig, trigger: &Trigger, options: &ReleaseOptions) -> Result<ReleasePlan> {
    let resolver = ReleaseCapabilityResolver::new(config.clone(), HostOs::current(), options.any_host);
    let plan = pipeline::plan(&steps_for(trigger, config), &resolver)?;

    Ok(ReleasePlan {
        trigger: trigger.clone(),
        steps: plan.steps,
    })
}

/// Run the whole graph for a trigger. `host` overrides the GitHub client.
pub fn run(
    root: &Path,
    config: &ReleaseConfig,
    trigger: &Trigger,
    options: &ReleaseOptions,
    host: Option<Arc<dyn ReleaseHost>>,
) -> Result<ReleaseRun> {
    let steps = steps_for(trigger, config);
    let resolver = ReleaseCapabilityResolver::new(config.clone(), HostOs::current(), options.any_host);
    let executor = ReleaseStepExecutor::new(
        root.to_path_buf(),
        config.clone(),
        trigger.clone(),
        options.any_host,
        host,
    );

    let result = pipeline::run(&steps, Arc::new(executor), Arc::new(resolver))?;

    Ok(ReleaseRun {
        trigger: trigger.clone(),
        result,
    })
}

/// Run one step of the graph by id; CI runs one job per step.
pub fn run_step(
    root: &Path,
    config: &ReleaseConfig,
    trigger: &Trigger,
    step_id: &str,
    options: &ReleaseOptions,
    host: Option<Arc<dyn ReleaseHost>>,
) -> Result<ReleaseStepRun> {
    let steps = steps_for(trigger, config);
    let step = steps.iter().find(|s| s.id == step_id).ok_or_else(|| {
        Error::validation_invalid_argument(
            "step",
            format!("No step '{}' for ref '{}'", step_id, trigger.git_ref),
            Some(step_id.to_string()),
            Some(steps.iter().map(|s| s.id.clone()).collect()),
        )
    })?;

    let resolver = ReleaseCapabilityResolver::new(config.clone(), HostOs::current(), options.any_host);
    let executor = ReleaseStepExecutor::new(
        root.to_path_buf(),
        config.clone(),
        trigger.clone(),
        options.any_host,
        host,
    );

    Ok(ReleaseStepRun {
        trigger: trigger.clone(),
        step: pipeline::run_single(step, &executor, &resolver),
    })
}
