use clap::{Args, Subcommand};
use serde::Serialize;

use foundry_release::config::{self, ReleaseConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration (file merged with defaults)
    Show {
        /// Show only built-in defaults (ignore foundry-release.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Write the default configuration to foundry-release.json
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    path: String,
    exists: bool,
    config: ReleaseConfig,
}

pub fn run(args: ConfigArgs, global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = config::config_path(global.root());

    match args.command {
        ConfigCommand::Show { builtin } => {
            let exists = path.exists();
            let config = if builtin {
                ReleaseConfig::default()
            } else {
                global.load_config()?
            };
            Ok((
                ConfigOutput {
                    command: "config.show".to_string(),
                    path: path.display().to_string(),
                    exists,
                    config,
                },
                0,
            ))
        }
        ConfigCommand::Init { force } => {
            let config = ReleaseConfig::default();
            let written = config::save(global.root(), &config, force)?;
            Ok((
                ConfigOutput {
                    command: "config.init".to_string(),
                    path: written.display().to_string(),
                    exists: true,
                    config,
                },
                0,
            ))
        }
    }
}
