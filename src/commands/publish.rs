use clap::Args;
use serde::Serialize;

use foundry_release::hosting::GitHubClient;
use foundry_release::publish::{self, PreparedRelease, PublishResult};
use foundry_release::trigger::Trigger;

use super::CmdResult;

#[derive(Args)]
pub struct PublishArgs {
    /// Tag ref to publish (default: $GITHUB_REF)
    #[arg(long = "ref", value_name = "REF")]
    git_ref: Option<String>,

    /// Run every local check without contacting the host
    #[arg(long)]
    dry_run: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum PublishOutput {
    Prepared(PreparedRelease),
    Published(PublishResult),
}

pub fn run(args: PublishArgs, global: &super::GlobalArgs) -> CmdResult<PublishOutput> {
    let config = global.load_config()?;
    let trigger = Trigger::resolve(global.root(), None, args.git_ref.as_deref())?;

    let prepared = publish::prepare(global.root(), &config, &trigger.git_ref)?;
    if args.dry_run {
        return Ok((PublishOutput::Prepared(prepared), 0));
    }

    let client = GitHubClient::from_env(&config.publish)?;
    let result = publish::publish(&prepared, &client)?;
    Ok((PublishOutput::Published(result), 0))
}
