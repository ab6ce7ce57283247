mod operations;
mod primitives;
mod tags;

pub use operations::*;
pub use primitives::*;
pub use tags::*;

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::utils::command;

fn execute_git(path: &Path, args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new("git").args(args).current_dir(path).output()
}

/// Run git and return trimmed stdout, mapping failures to `git.command_failed`.
fn git_stdout(path: &Path, args: &[&str]) -> Result<String> {
    let output = execute_git(path, args).map_err(|e| {
        Error::git_command_failed(format!("Failed to run git {}: {}", args.join(" "), e))
    })?;

    if !output.status.success() {
        return Err(command_failed(args, &output));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn command_failed(args: &[&str], output: &std::process::Output) -> Error {
    let text = command::error_text(output);
    let mut err = Error::git_command_failed(format!("git {} failed: {}", args.join(" "), text));
    err.details = serde_json::json!({
        "args": args,
        "exitCode": output.status.code().unwrap_or(1),
        "stderr": text,
    });
    err
}
