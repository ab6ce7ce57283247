use serde::Serialize;

use crate::build::BuildResult;
use crate::gates::Gate;
use crate::pipeline::{PipelinePlanStep, PipelineRunResult, PipelineStepResult};
use crate::trigger::Trigger;

pub(crate) const NIGHTLY_STEP: &str = "nightly";
pub(crate) const PUBLISH_STEP: &str = "publish";

/// Step types of the release graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseStepType {
    Check(Gate),
    Nightly,
    Build,
    Publish,
}

impl ReleaseStepType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ReleaseStepType::Check(Gate::Style) => "check.style",
            ReleaseStepType::Check(Gate::Analysis) => "check.analysis",
            ReleaseStepType::Nightly => "nightly",
            ReleaseStepType::Build => "build",
            ReleaseStepType::Publish => "publish",
        }
    }

    pub(crate) fn from_str(s: &str) -> Option<Self> {
        match s {
            "check.style" => Some(ReleaseStepType::Check(Gate::Style)),
            "check.analysis" => Some(ReleaseStepType::Check(Gate::Analysis)),
            "nightly" => Some(ReleaseStepType::Nightly),
            "build" => Some(ReleaseStepType::Build),
            "publish" => Some(ReleaseStepType::Publish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Treat every platform as buildable on this host.
    pub any_host: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    pub trigger: Trigger,
    pub steps: Vec<PipelinePlanStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRun {
    pub trigger: Trigger,
    #[serde(flatten)]
    pub result: PipelineRunResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseStepRun {
    pub trigger: Trigger,
    pub step: PipelineStepResult,
}

/// Shared between concurrently running steps.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReleaseContext {
    pub artifacts: Vec<BuildResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_strings_round_trip() {
        for st in [
            ReleaseStepType::Check(Gate::Style),
            ReleaseStepType::Check(Gate::Analysis),
            ReleaseStepType::Nightly,
            ReleaseStepType::Build,
            ReleaseStepType::Publish,
        ] {
            assert_eq!(ReleaseStepType::from_str(st.as_str()), Some(st));
        }
        assert_eq!(ReleaseStepType::from_str("deploy"), None);
    }
}
