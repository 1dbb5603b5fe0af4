use std::path::Path;

use anyhow::Result;

use crate::application::{UpdateAction, UpdateReport};
use crate::config::{NpmEnvironment, Settings};
use crate::npm::Npm;
use crate::runtime::Runtime;

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
    Completed(UpdateReport),
    /// No npm executable could be located; nothing was run.
    NpmNotFound,
}

#[tracing::instrument(skip(runtime, settings))]
pub fn update<R: Runtime>(runtime: &R, settings: &Settings, npm_path: Option<&Path>) -> RunStatus {
    let env = NpmEnvironment::from_runtime(runtime);

    let Some(npm) = Npm::locate(runtime, &env, npm_path) else {
        match npm_path {
            Some(path) => println!("npm not found at {}.", path.display()),
            None => println!("npm not found. Please install Node.js/npm or restart the shell."),
        }
        return RunStatus::NpmNotFound;
    };

    println!("\nnpm CLI Updater");
    println!("This tool checks global npm installations and updates when needed.");

    let report = UpdateAction::new(runtime, npm, settings).run();

    println!("\nDone");
    println!("All packages were checked.");
    RunStatus::Completed(report)
}

/// Keep the console open until the user presses Enter, when enabled.
pub fn pause_before_exit<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    if settings.pause_at_end {
        runtime.pause("\nPress Enter to exit ... ")?;
    }
    Ok(())
}
