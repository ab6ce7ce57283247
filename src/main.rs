use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{build, bump, config, nightly, pipeline, publish, status, version, workflow};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "foundry-release")]
#[command(version = VERSION)]
#[command(about = "Version bump, nightly tag rotation and release pipeline for SMB3 Foundry")]
struct Cli {
    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bump the version file, commit, tag and push
    Bump(bump::BumpArgs),
    /// Move the nightly tag to HEAD of the dev branch
    Nightly(nightly::NightlyArgs),
    /// Plan or run the release step graph for a trigger
    Pipeline(pipeline::PipelineArgs),
    /// Package one platform into the artifact directory
    Build(build::BuildArgs),
    /// Publish a tag as a release with every platform artifact
    Publish(publish::PublishArgs),
    /// Render the CI workflow
    Workflow(workflow::WorkflowArgs),
    /// Compare the local version with the newest hosted release
    Status(status::StatusArgs),
    /// Version file operations
    Version(version::VersionArgs),
    /// Show or initialize foundry-release.json
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { path: cli.path };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
