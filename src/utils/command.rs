//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

/// Run a command in a directory, returning None on failure or empty output.
pub fn run_in_optional(dir: &Path, program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Check if a command succeeds in a directory without capturing output.
pub fn succeeded_in(dir: &Path, program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Captured result of a shell command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShellOutput {
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ShellOutput {
    /// Last `lines` lines of the most useful stream (stderr, else stdout).
    pub fn tail(&self, lines: usize) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail: Vec<&str> = text.lines().rev().take(lines).collect();
        tail.into_iter().rev().collect::<Vec<_>>().join("\n")
    }
}

/// Run a command line through the platform shell (`sh -c` or `cmd /C`).
pub fn run_shell_in(dir: &Path, command: &str, env: &[(&str, &str)]) -> ShellOutput {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    cmd.current_dir(dir);
    cmd.envs(env.iter().copied());

    match cmd.output() {
        Ok(out) => ShellOutput {
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        },
        Err(e) => ShellOutput {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("Command error: {}", e),
        },
    }
}

/// Translate universal POSIX exit codes into a hint.
pub fn exit_code_hint(exit_code: i32) -> Option<&'static str> {
    match exit_code {
        127 => Some("Command not found. Check that the command and its dependencies are installed and in PATH."),
        126 => Some("Permission denied. Check file permissions on the script."),
        _ => None,
    }
}
