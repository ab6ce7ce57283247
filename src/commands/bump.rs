use std::path::PathBuf;

use clap::Args;

use foundry_release::bump::{self, BumpOptions, BumpResult};
use foundry_release::git::TagMessage;
use foundry_release::prompt::PromptEngine;

use super::CmdResult;

#[derive(Args)]
pub struct BumpArgs {
    /// New version, or patch/minor/major (prompted for when omitted)
    #[arg(long = "version", value_name = "VERSION")]
    new_version: Option<String>,

    /// Tag annotation text; first line is the release name
    #[arg(long, conflicts_with = "notes_file")]
    notes: Option<String>,

    /// Read the tag annotation from a file
    #[arg(long, value_name = "PATH")]
    notes_file: Option<PathBuf>,

    /// Answer yes to every step confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// Show the planned steps without changing anything
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: BumpArgs, global: &super::GlobalArgs) -> CmdResult<BumpResult> {
    let config = global.load_config()?;

    let notes = match (args.notes, args.notes_file) {
        (Some(text), _) => Some(TagMessage::Inline(text)),
        (None, Some(path)) => Some(TagMessage::File(path)),
        (None, None) => None,
    };

    let options = BumpOptions {
        version: args.new_version,
        notes,
        dry_run: args.dry_run,
    };
    let prompter = PromptEngine::new(args.yes);

    let result = bump::run(global.root(), &config, &options, &prompter)?;
    Ok((result, 0))
}
