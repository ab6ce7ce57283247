use crate::config::ReleaseConfig;
use crate::matrix::{self, HostOs};
use crate::pipeline::{PipelineCapabilityResolver, PipelineStep};

use super::types::ReleaseStepType;

/// Builds only run on their platform's OS unless `any_host` is set.
pub(crate) struct ReleaseCapabilityResolver {
    config: ReleaseConfig,
    host: Option<HostOs>,
    any_host: bool,
}

impl ReleaseCapabilityResolver {
    pub fn new(config: ReleaseConfig, host: Option<HostOs>, any_host: bool) -> Self {
        Self {
            config,
            host,
            any_host,
        }
    }
}

impl PipelineCapabilityResolver for ReleaseCapabilityResolver {
    fn missing(&self, step: &PipelineStep) -> Vec<String> {
        match ReleaseStepType::from_str(&step.step_type) {
            None => vec![format!("Unknown step type '{}'", step.step_type)],
            Some(ReleaseStepType::Build) => {
                let Some(prefix) = step.config_str("platform") else {
                    return vec!["Build step has no platform".to_string()];
                };
                match matrix::find(&self.config.platforms, prefix) {
                    Err(err) => vec![err.message],
                    Ok(platform) if self.any_host || platform.buildable_on(self.host) => Vec::new(),
                    Ok(platform) => vec![format!(
                        "'{}' builds on {} (this host: {})",
                        platform.prefix,
                        platform.os.as_str(),
                        self.host.map(|h| h.as_str()).unwrap_or("unknown")
                    )],
                }
            }
            Some(_) => Vec::new(),
        }
    }
}
