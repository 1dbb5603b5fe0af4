use anyhow::Result;
use clap::Parser;
use log::warn;
use npm_updater::commands::{self, RunStatus};
use npm_updater::config::Settings;
use npm_updater::runtime::{RealRuntime, interrupt};
use std::path::PathBuf;

/// Exit code when no npm executable can be found.
const EXIT_NPM_NOT_FOUND: i32 = 2;

/// npm-updater - keep npm and selected global CLIs up to date
///
/// Compares globally installed npm packages against the registry and
/// installs newer versions. npm itself is updated first.
///
/// Examples:
///   npm-updater                # update npm and all configured CLIs
///   npm-updater --dry-run      # only report what is outdated
#[derive(Parser, Debug)]
#[command(author, version = env!("NPM_UPDATER_VERSION"), about)]
struct Cli {
    /// Do not update npm itself before the configured packages
    #[arg(long)]
    no_self_update: bool,

    /// Ask for confirmation before every install
    #[arg(long)]
    confirm: bool,

    /// Exit without waiting for Enter at the end
    #[arg(long)]
    no_pause: bool,

    /// Report outdated packages without installing anything
    #[arg(long)]
    dry_run: bool,

    /// npm executable to use instead of searching the PATH
    #[arg(long, env = "NPM_UPDATER_NPM", value_name = "PATH")]
    npm: Option<PathBuf>,
}

impl Cli {
    /// Compiled-in defaults, overridden by the flags given for this run.
    fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            auto_update_npm: defaults.auto_update_npm && !self.no_self_update,
            confirm_before_update: defaults.confirm_before_update || self.confirm,
            pause_at_end: defaults.pause_at_end && !self.no_pause,
            dry_run: self.dry_run,
            targets: defaults.targets,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = cli.settings();

    interrupt::install_handler(settings.pause_at_end)?;

    let runtime = RealRuntime;
    let status = commands::update(&runtime, &settings, cli.npm.as_deref());
    if let Err(e) = commands::pause_before_exit(&runtime, &settings) {
        warn!("Failed to wait for Enter: {:#}", e);
    }

    if let RunStatus::NpmNotFound = status {
        std::process::exit(EXIT_NPM_NOT_FOUND);
    }
    Ok(())
}
