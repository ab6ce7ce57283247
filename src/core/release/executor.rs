use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::build::{self, BuildOptions};
use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::gates::{self, Gate};
use crate::hosting::{GitHubClient, ReleaseHost};
use crate::matrix;
use crate::nightly::{self, NightlyOptions};
use crate::pipeline::{PipelineStep, PipelineStepExecutor, PipelineStepResult};
use crate::publish;
use crate::trigger::Trigger;

use super::types::{ReleaseContext, ReleaseStepType};

pub(crate) struct ReleaseStepExecutor {
    root: PathBuf,
    config: ReleaseConfig,
    trigger: Trigger,
    any_host: bool,
    host: Option<Arc<dyn ReleaseHost>>,
    pub(crate) context: Mutex<ReleaseContext>,
}

impl ReleaseStepExecutor {
    pub fn new(
        root: PathBuf,
        config: ReleaseConfig,
        trigger: Trigger,
        any_host: bool,
        host: Option<Arc<dyn ReleaseHost>>,
    ) -> Self {
        Self {
            root,
            config,
            trigger,
            any_host,
            host,
            context: Mutex::new(ReleaseContext::default()),
        }
    }

    fn to_data<T: Serialize>(value: &T, context: &str) -> Result<serde_json::Value> {
        serde_json::to_value(value)
            .map_err(|e| Error::internal_json(e.to_string(), Some(context.to_string())))
    }

    fn release_host(&self) -> Result<Arc<dyn ReleaseHost>> {
        match &self.host {
            Some(host) => Ok(Arc::clone(host)),
            None => Ok(Arc::new(GitHubClient::from_env(&self.config.publish)?)),
        }
    }

    fn run_gate(&self, step: &PipelineStep, gate: Gate) -> Result<PipelineStepResult> {
        let result = gates::run(&self.root, &self.config, gate)?;
        Ok(PipelineStepResult::success(step, Self::to_data(&result, "gate output")?))
    }

    fn run_nightly(&self, step: &PipelineStep) -> Result<PipelineStepResult> {
        let options = NightlyOptions {
            git_ref: Some(self.trigger.git_ref.clone()),
            dry_run: false,
        };
        let result = nightly::rotate(&self.root, &self.config, &options)?;
        Ok(PipelineStepResult::success(step, Self::to_data(&result, "nightly output")?))
    }

    fn run_build(&self, step: &PipelineStep) -> Result<PipelineStepResult> {
        let prefix = step.config_str("platform").ok_or_else(|| {
            Error::validation_missing_argument(vec![format!("{}.platform", step.id)])
        })?;
        let platform = matrix::find(&self.config.platforms, prefix)?;
        let result = build::build_platform(
            &self.root,
            &self.config,
            platform,
            &BuildOptions {
                any_host: self.any_host,
            },
        )?;
        let data = Self::to_data(&result, "build output")?;

        self.context
            .lock()
            .map_err(|_| Error::internal_unexpected("Release context lock poisoned"))?
            .artifacts
            .push(result);

        Ok(PipelineStepResult::success(step, data))
    }

    fn run_publish(&self, step: &PipelineStep) -> Result<PipelineStepResult> {
        let prepared = publish::prepare(&self.root, &self.config, &self.trigger.git_ref)?;
        let host = self.release_host()?;
        let result = publish::publish(&prepared, host.as_ref())?;

        let mut outcome = PipelineStepResult::success(step, Self::to_data(&result, "publish output")?);
        let built = self
            .context
            .lock()
            .map_err(|_| Error::internal_unexpected("Release context lock poisoned"))?
            .artifacts
            .len();
        if built == 0 {
            outcome
                .warnings
                .push("Published artifacts that were not built in this run".to_string());
        }
        Ok(outcome)
    }
}

impl PipelineStepExecutor for ReleaseStepExecutor {
    fn execute_step(&self, step: &PipelineStep) -> Result<PipelineStepResult> {
        match ReleaseStepType::from_str(&step.step_type) {
            Some(ReleaseStepType::Check(gate)) => self.run_gate(step, gate),
            Some(ReleaseStepType::Nightly) => self.run_nightly(step),
            Some(ReleaseStepType::Build) => self.run_build(step),
            Some(ReleaseStepType::Publish) => self.run_publish(step),
            None => Err(Error::validation_invalid_argument(
                "step",
                format!("Unknown step type '{}'", step.step_type),
                Some(step.id.clone()),
                None,
            )),
        }
    }
}
