use clap::Args;

use foundry_release::build::{self, BuildOptions, BuildResult};

use super::CmdResult;

#[derive(Args)]
pub struct BuildArgs {
    /// Platform prefix from the build matrix (linux, win64, osx)
    platform: String,

    /// Run the build even if the platform targets another OS
    #[arg(long)]
    any_host: bool,
}

pub fn run(args: BuildArgs, global: &super::GlobalArgs) -> CmdResult<BuildResult> {
    let config = global.load_config()?;
    let options = BuildOptions {
        any_host: args.any_host,
    };

    let result = build::build(global.root(), &config, &args.platform, &options)?;
    Ok((result, 0))
}
