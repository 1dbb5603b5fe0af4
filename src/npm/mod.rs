//! npm client: reads the global inventory and registry, and runs installs.
//!
//! Every call is a single, unretried npm invocation. Read failures degrade to
//! empty/unknown results with a printed warning; only installs report errors.

mod inventory;
mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::{debug, warn};

use crate::config::NpmEnvironment;
use crate::runtime::{CommandSpec, Runtime};

pub use inventory::{InstalledPackages, parse_listing, parse_view_version};
pub use summary::InstallSummary;

/// Executable names tried, in order, when no explicit npm path is given.
pub const NPM_EXECUTABLES: [&str; 2] = ["npm", "npm.cmd"];

pub struct Npm<'a, R: Runtime> {
    runtime: &'a R,
    program: PathBuf,
    env: &'a NpmEnvironment,
}

impl<'a, R: Runtime> Npm<'a, R> {
    pub fn new(runtime: &'a R, program: PathBuf, env: &'a NpmEnvironment) -> Self {
        Self {
            runtime,
            program,
            env,
        }
    }

    /// Resolve the npm executable, or `None` if it cannot be found.
    ///
    /// An explicit path takes precedence over the search path lookup.
    pub fn locate(
        runtime: &'a R,
        env: &'a NpmEnvironment,
        explicit: Option<&Path>,
    ) -> Option<Self> {
        let program = match explicit {
            Some(path) => runtime.which(&path.to_string_lossy()),
            None => NPM_EXECUTABLES.iter().find_map(|name| runtime.which(name)),
        }?;
        debug!("Using npm at {}", program.display());
        Some(Self::new(runtime, program, env))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.program)
            .args(args)
            .envs(self.env.overrides().iter().cloned())
    }

    /// Globally installed packages, or an empty map (with a warning) if they cannot be read.
    #[tracing::instrument(skip(self))]
    pub fn list_installed(&self) -> InstalledPackages {
        let output = match self
            .runtime
            .run(&self.command(["ls", "-g", "--depth=0", "--json"]))
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run npm ls: {:#}", e);
                println!("Warning: could not read global package list: {:#}", e);
                return InstalledPackages::new();
            }
        };

        // npm ls exits non-zero for dependency problems but still prints the listing
        if !output.success() && !output.stderr.is_empty() {
            println!(
                "Warning: could not read global package list: {}",
                output.stderr
            );
            return InstalledPackages::new();
        }

        match parse_listing(&output.stdout) {
            Ok(packages) => {
                debug!("Found {} global packages", packages.len());
                packages
            }
            Err(e) => {
                debug!("Unparsable npm ls output: {:#}", e);
                println!("Warning: unexpected output from 'npm ls -g --json'.");
                InstalledPackages::new()
            }
        }
    }

    /// Latest published version of `package`, or `None` if it cannot be determined.
    #[tracing::instrument(skip(self))]
    pub fn latest_version(&self, package: &str) -> Option<String> {
        let output = match self
            .runtime
            .run(&self.command(["view", package, "version", "--json"]))
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to query {}: {:#}", package, e);
                return None;
            }
        };

        if !output.success() {
            debug!(
                "npm view {} failed ({}): {}",
                package,
                output.code,
                output.diagnostic()
            );
            return None;
        }

        parse_view_version(&output.stdout)
    }

    /// Version of npm itself.
    #[tracing::instrument(skip(self))]
    pub fn own_version(&self) -> Option<String> {
        match self.runtime.run(&self.command(["-v"])) {
            Ok(output) if output.success() && !output.stdout.is_empty() => Some(output.stdout),
            Ok(output) => {
                debug!("npm -v failed ({}): {}", output.code, output.diagnostic());
                None
            }
            Err(e) => {
                warn!("Failed to run npm -v: {:#}", e);
                None
            }
        }
    }

    /// Install or upgrade `spec` globally.
    ///
    /// On failure the error carries npm's diagnostic output.
    #[tracing::instrument(skip(self))]
    pub fn install(&self, spec: &str) -> Result<InstallSummary> {
        let output = self.runtime.run(&self.command(["install", "-g", spec]))?;
        if !output.success() {
            return Err(anyhow!("{}", output.diagnostic()));
        }
        Ok(InstallSummary::parse(&output.stdout))
    }
}
