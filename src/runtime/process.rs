//! Child process execution.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use log::debug;

use super::RealRuntime;

/// Conventional shell exit code for "command not found".
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables added to the inherited environment of the child.
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs<I>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.envs.extend(envs);
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit code and trimmed output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// The text most useful to show for a failure: stderr, or stdout if stderr is empty.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self, command), fields(command = %command))]
    pub(crate) fn run_impl(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().cloned())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Executable not found: {}", command.program.display());
                return Ok(CommandOutput {
                    code: NOT_FOUND_EXIT_CODE,
                    stdout: String::new(),
                    stderr: format!("Command not found: {}", command.program.display()),
                });
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to run {}", command));
            }
        };

        // A child terminated by a signal has no exit code
        let code = output.status.code().unwrap_or(-1);
        debug!("{} exited with code {}", command, code);

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
