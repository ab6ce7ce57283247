use clap::Args;

use foundry_release::hosting::GitHubClient;
use foundry_release::status::{self, UpdateStatus};

use super::CmdResult;

#[derive(Args)]
pub struct StatusArgs {}

pub fn run(_args: StatusArgs, global: &super::GlobalArgs) -> CmdResult<UpdateStatus> {
    let config = global.load_config()?;

    // Listing public releases works unauthenticated; use the token when present.
    let token = std::env::var(&config.publish.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty());
    let client = GitHubClient::new(&config.publish, token)?;

    let result = status::check(global.root(), &config, &client)?;
    Ok((result, 0))
}
