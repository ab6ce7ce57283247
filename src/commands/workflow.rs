use std::path::PathBuf;

use clap::Args;

use foundry_release::workflow::{self, WorkflowOutput};

use super::CmdResult;

#[derive(Args)]
pub struct WorkflowArgs {
    /// Write the YAML here (relative to --path) instead of returning it
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,
}

pub fn run(args: WorkflowArgs, global: &super::GlobalArgs) -> CmdResult<WorkflowOutput> {
    let config = global.load_config()?;
    let result = workflow::generate(global.root(), &config, args.output.as_deref())?;
    Ok((result, 0))
}
