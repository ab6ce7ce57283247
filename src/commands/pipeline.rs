use clap::{Args, Subcommand};
use serde::Serialize;

use foundry_release::pipeline::PipelineRunStatus;
use foundry_release::release::{self, ReleaseOptions, ReleasePlan, ReleaseRun, ReleaseStepRun};
use foundry_release::trigger::Trigger;

use super::{CmdResult, PIPELINE_FAILURE_EXIT};

#[derive(Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    command: PipelineCommand,
}

#[derive(Args, Clone)]
struct TriggerArgs {
    /// Trigger event: push, pull_request or manual (default: $GITHUB_EVENT_NAME)
    #[arg(long)]
    event: Option<String>,

    /// Git ref the trigger fired for (default: $GITHUB_REF, then the current branch)
    #[arg(long = "ref", value_name = "REF")]
    git_ref: Option<String>,

    /// Treat every platform as buildable on this host
    #[arg(long)]
    any_host: bool,
}

#[derive(Subcommand)]
enum PipelineCommand {
    /// Show the ordered step graph for a trigger
    Plan {
        #[command(flatten)]
        trigger: TriggerArgs,
    },
    /// Run every step of the graph
    Run {
        #[command(flatten)]
        trigger: TriggerArgs,
    },
    /// Run a single step by id (one CI job per step)
    Step {
        /// Step id, e.g. check.style, nightly, build.linux, publish
        id: String,

        #[command(flatten)]
        trigger: TriggerArgs,
    },
}

#[derive(Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PipelineOutput {
    Plan(ReleasePlan),
    Run(ReleaseRun),
    Step(ReleaseStepRun),
}

fn resolve(global: &super::GlobalArgs, args: &TriggerArgs) -> foundry_release::Result<(Trigger, ReleaseOptions)> {
    let trigger = Trigger::resolve(global.root(), args.event.as_deref(), args.git_ref.as_deref())?;
    Ok((
        trigger,
        ReleaseOptions {
            any_host: args.any_host,
        },
    ))
}

fn exit_code(status: PipelineRunStatus) -> i32 {
    if status == PipelineRunStatus::Success {
        0
    } else {
        PIPELINE_FAILURE_EXIT
    }
}

pub fn run(args: PipelineArgs, global: &super::GlobalArgs) -> CmdResult<PipelineOutput> {
    let config = global.load_config()?;

    match args.command {
        PipelineCommand::Plan { trigger } => {
            let (trigger, options) = resolve(global, &trigger)?;
            let plan = release::plan(&config, &trigger, &options)?;
            Ok((PipelineOutput::Plan(plan), 0))
        }
        PipelineCommand::Run { trigger } => {
            let (trigger, options) = resolve(global, &trigger)?;
            let run = release::run(global.root(), &config, &trigger, &options, None)?;
            let code = exit_code(run.result.status);
            Ok((PipelineOutput::Run(run), code))
        }
        PipelineCommand::Step { id, trigger } => {
            let (trigger, options) = resolve(global, &trigger)?;
            let run = release::run_step(global.root(), &config, &trigger, &id, &options, None)?;
            let code = exit_code(run.step.status);
            Ok((PipelineOutput::Step(run), code))
        }
    }
}
