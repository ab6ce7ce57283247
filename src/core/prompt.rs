//! Operator prompts for the local bump procedure.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{Error, Result};

/// Source of operator answers. The CLI reads a terminal; tests script answers.
pub trait Prompter {
    /// Free-form answer, trimmed.
    fn ask(&self, question: &str) -> Result<String>;
    /// Yes/no gate before a step runs.
    fn confirm(&self, question: &str) -> Result<bool>;
    /// Whether a human can answer (and an editor can be opened).
    fn is_interactive(&self) -> bool;
}

/// Terminal-backed prompter. With `assume_yes`, every confirmation passes.
pub struct PromptEngine {
    interactive: bool,
    assume_yes: bool,
}

impl PromptEngine {
    /// Create engine with automatic TTY detection.
    pub fn new(assume_yes: bool) -> Self {
        Self {
            interactive: io::stdin().is_terminal() && io::stderr().is_terminal(),
            assume_yes,
        }
    }

    pub fn with_interactive(interactive: bool, assume_yes: bool) -> Self {
        Self {
            interactive,
            assume_yes,
        }
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        eprint!("{}", prompt);
        io::stderr().flush().ok();

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;
        Ok(line.trim().to_string())
    }
}

impl Prompter for PromptEngine {
    fn ask(&self, question: &str) -> Result<String> {
        if !self.interactive {
            return Err(Error::validation_missing_argument(vec!["version".to_string()])
                .with_hint("Pass --version when not running in a terminal"));
        }
        self.read_line(&format!("{} ", question))
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !self.interactive {
            return Err(Error::validation_invalid_argument(
                "yes",
                "Confirmation required but no terminal is attached",
                None,
                None,
            )
            .with_hint("Pass --yes to run every step without prompting"));
        }

        let answer = self.read_line(&format!("{} [y/N]: ", question))?;
        Ok(answer.to_lowercase().starts_with('y'))
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}
