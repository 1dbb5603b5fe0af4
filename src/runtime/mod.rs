//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over everything the updater
//! needs from the host, enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables and executable lookup
//! - `process` - Child process execution (the process runner)
//! - `user` - User interaction (confirmation and pause prompts)
//! - `interrupt` - Ctrl-C handling around those prompts

mod env;
pub mod interrupt;
mod process;
mod user;

use anyhow::Result;
use std::env as std_env;
use std::path::PathBuf;

pub use process::{CommandOutput, CommandSpec, NOT_FOUND_EXIT_CODE};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    /// Resolve an executable name (or path) against the search path.
    fn which(&self, name: &str) -> Option<PathBuf>;

    // Processes
    /// Run a command to completion, capturing its exit code and trimmed output.
    ///
    /// A missing executable is not an error: it is reported as exit code
    /// [`NOT_FOUND_EXIT_CODE`] with an explanation in `stderr`.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    // User interaction
    /// Prompt user for confirmation. Returns true if user confirms (y/yes), false otherwise.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Print a prompt and block until the user presses Enter (or input is closed).
    fn pause(&self, prompt: &str) -> Result<()>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        self.which_impl(name)
    }

    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.run_impl(command)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirm_impl(prompt)
    }

    fn pause(&self, prompt: &str) -> Result<()> {
        self.pause_impl(prompt)
    }
}
