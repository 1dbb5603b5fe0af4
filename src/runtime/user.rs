//! User interaction operations (confirmation and pause prompts).

use anyhow::Result;

use super::RealRuntime;
use super::interrupt::{self, PromptGuard};

use std::io::{self, BufRead, Write};

/// Write `prompt` and read one line of input. Closed input reads as an empty line.
fn prompt_line<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<String> {
    output.write_all(prompt.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

/// Only an explicit "y"/"yes" allows an install.
fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", prompt), input, output)?;
    Ok(is_affirmative(&answer))
}

pub(crate) fn pause_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    prompt_line(prompt, input, output).map(drop)
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let guard = PromptGuard::enter();
        let result = confirm_with_io(prompt, &mut io::stdin().lock(), &mut io::stdout());
        drop(guard);
        interrupt::exit_if_interrupted();
        result
    }

    pub(crate) fn pause_impl(&self, prompt: &str) -> Result<()> {
        let guard = PromptGuard::enter();
        let result = pause_with_io(prompt, &mut io::stdin().lock(), &mut io::stdout());
        drop(guard);
        interrupt::exit_if_interrupted();
        result
    }
}
