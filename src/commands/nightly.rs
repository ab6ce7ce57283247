use clap::Args;

use foundry_release::nightly::{self, NightlyOptions, NightlyResult};

use super::CmdResult;

#[derive(Args)]
pub struct NightlyArgs {
    /// Branch ref to rotate for (e.g. refs/heads/dev); defaults to the checkout
    #[arg(long = "ref", value_name = "REF", env = "GITHUB_REF")]
    git_ref: Option<String>,

    /// Compute the annotation without touching any tag
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: NightlyArgs, global: &super::GlobalArgs) -> CmdResult<NightlyResult> {
    let config = global.load_config()?;
    let options = NightlyOptions {
        git_ref: args.git_ref,
        dry_run: args.dry_run,
    };

    let result = nightly::rotate(global.root(), &config, &options)?;
    Ok((result, 0))
}
