use std::path::{Path, PathBuf};

use foundry_release::config::ReleaseConfig;

pub type CmdResult<T> = foundry_release::Result<(T, i32)>;

/// Exit code for pipeline runs and steps that did not fully succeed.
pub(crate) const PIPELINE_FAILURE_EXIT: i32 = 20;

pub(crate) struct GlobalArgs {
    pub path: PathBuf,
}

impl GlobalArgs {
    pub fn root(&self) -> &Path {
        &self.path
    }

    pub fn load_config(&self) -> foundry_release::Result<ReleaseConfig> {
        foundry_release::config::load(&self.path)
    }
}

pub mod build;
pub mod bump;
pub mod config;
pub mod nightly;
pub mod pipeline;
pub mod publish;
pub mod status;
pub mod version;
pub mod workflow;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (foundry_release::Result<serde_json::Value>, i32) {
    crate::tty::status("foundry-release is working...");

    match command {
        crate::Commands::Bump(args) => dispatch!(args, global, bump),
        crate::Commands::Nightly(args) => dispatch!(args, global, nightly),
        crate::Commands::Pipeline(args) => dispatch!(args, global, pipeline),
        crate::Commands::Build(args) => dispatch!(args, global, build),
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
        crate::Commands::Workflow(args) => dispatch!(args, global, workflow),
        crate::Commands::Status(args) => dispatch!(args, global, status),
        crate::Commands::Version(args) => dispatch!(args, global, version),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
