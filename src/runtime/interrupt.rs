//! Ctrl-C handling.
//!
//! The handler runs on its own thread. While the main thread is blocked at a
//! prompt it owns stdin, so the handler only records the interrupt and the
//! prompt exits with [`EXIT_INTERRUPTED`] once its read returns. Otherwise the
//! handler pauses (when enabled) and exits itself.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::debug;

use super::{RealRuntime, Runtime};

/// Standard exit code for Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static AT_PROMPT: AtomicBool = AtomicBool::new(false);

/// Install the process-wide Ctrl-C handler.
pub fn install_handler(pause_at_end: bool) -> Result<()> {
    ctrlc::set_handler(move || {
        INTERRUPTED.store(true, Ordering::SeqCst);
        println!("\nAborted by user.");

        if AT_PROMPT.load(Ordering::SeqCst) {
            debug!("Interrupted at a prompt, exiting once it returns");
            return;
        }

        // Hold stdout so the main thread stalls at its next status line
        let _stdout = std::io::stdout().lock();
        if pause_at_end {
            let _ = RealRuntime.pause("\nPress Enter to exit ... ");
        }
        std::process::exit(EXIT_INTERRUPTED);
    })
    .context("Failed to install Ctrl-C handler")
}

/// Marks the calling thread as blocked on user input for its lifetime.
pub(crate) struct PromptGuard {
    outer: bool,
}

impl PromptGuard {
    pub(crate) fn enter() -> Self {
        Self {
            outer: !AT_PROMPT.swap(true, Ordering::SeqCst),
        }
    }
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        if self.outer {
            AT_PROMPT.store(false, Ordering::SeqCst);
        }
    }
}

pub(crate) fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Exit with [`EXIT_INTERRUPTED`] if Ctrl-C arrived while a prompt was waiting.
pub(crate) fn exit_if_interrupted() {
    if interrupted() {
        std::process::exit(EXIT_INTERRUPTED);
    }
}
