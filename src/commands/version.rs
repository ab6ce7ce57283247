use clap::{Args, Subcommand};

use foundry_release::version::{self, VersionInfo};

use super::CmdResult;

#[derive(Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    command: VersionCommand,
}

#[derive(Subcommand)]
enum VersionCommand {
    /// Show the current version and the file it is read from
    Show,
}

pub fn run(args: VersionArgs, global: &super::GlobalArgs) -> CmdResult<VersionInfo> {
    match args.command {
        VersionCommand::Show => {
            let config = global.load_config()?;
            let info = version::read_version(global.root(), &config)?;
            Ok((info, 0))
        }
    }
}
