//! Quality gates: the style and static-analysis checks every trigger runs.

use std::path::Path;

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{CommandFailedDetails, Error, Result};
use crate::utils::command;

const OUTPUT_TAIL_LINES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Style,
    Analysis,
}

impl Gate {
    pub const ALL: [Gate; 2] = [Gate::Style, Gate::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Style => "style",
            Gate::Analysis => "analysis",
        }
    }

    pub fn step_id(&self) -> String {
        format!("check.{}", self.as_str())
    }

    pub fn command<'a>(&self, config: &'a ReleaseConfig) -> &'a str {
        match self {
            Gate::Style => &config.gates.style,
            Gate::Analysis => &config.gates.analysis,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GateResult {
    pub gate: Gate,
    pub command: String,
    pub exit_code: i32,
}

pub fn run(root: &Path, config: &ReleaseConfig, gate: Gate) -> Result<GateResult> {
    let cmd = gate.command(config);
    log_status!("gate", "{}: {}", gate.as_str(), cmd);

    let output = command::run_shell_in(root, cmd, &[]);
    if !output.success {
        let mut err = Error::gate_failed(
            gate.as_str(),
            CommandFailedDetails {
                command: cmd.to_string(),
                exit_code: output.exit_code,
                output_tail: output.tail(OUTPUT_TAIL_LINES),
            },
        );
        if let Some(hint) = command::exit_code_hint(output.exit_code) {
            err = err.with_hint(hint);
        }
        return Err(err);
    }

    Ok(GateResult {
        gate,
        command: cmd.to_string(),
        exit_code: output.exit_code,
    })
}
