//! Update action - brings npm and the configured CLIs up to date.
//!
//! For each target this:
//! - finds the installed version under any of the target's aliases
//! - resolves the latest published version (first alias the registry knows)
//! - installs the resolved alias globally when it is outdated
//!
//! The installed-name scan and the registry scan are independent, so they may
//! settle on different aliases of the same target. Both are reported as found.

use log::{debug, warn};

use crate::config::{Settings, Target};
use crate::npm::{InstallSummary, InstalledPackages, Npm};
use crate::package::is_outdated;
use crate::runtime::Runtime;

/// Install spec used when npm updates itself.
pub const NPM_SELF_SPEC: &str = "npm@latest";

/// Terminal state of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No latest version could be resolved, nothing was attempted.
    Unresolved,
    UpToDate,
    /// Outdated, but installs are disabled for this run.
    WouldUpdate,
    /// The user declined the confirmation prompt.
    Skipped,
    Updated {
        summary: InstallSummary,
        /// Version read back after the install, if it could be determined.
        now_installed: Option<String>,
    },
    /// The install command failed with this diagnostic.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub display: String,
    /// Alias under which the package was found installed.
    pub installed_name: Option<String>,
    pub installed_version: Option<String>,
    /// Alias that resolved a latest version and is used for installing.
    pub registry_name: Option<String>,
    pub latest_version: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Present when npm self-update was enabled.
    pub npm: Option<TargetReport>,
    pub targets: Vec<TargetReport>,
}

enum InstallStep {
    DryRun,
    Declined,
    Installed(InstallSummary),
    Failed(String),
}

pub struct UpdateAction<'a, R: Runtime> {
    runtime: &'a R,
    npm: Npm<'a, R>,
    settings: &'a Settings,
    installed: InstalledPackages,
}

impl<'a, R: Runtime> UpdateAction<'a, R> {
    pub fn new(runtime: &'a R, npm: Npm<'a, R>, settings: &'a Settings) -> Self {
        Self {
            runtime,
            npm,
            settings,
            installed: InstalledPackages::new(),
        }
    }

    pub fn installed(&self) -> &InstalledPackages {
        &self.installed
    }

    /// Re-read the global inventory, replacing the in-memory map wholesale.
    pub fn refresh_installed(&mut self) {
        self.installed = self.npm.list_installed();
    }

    /// Update npm (when enabled) and then every configured target.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> UpdateReport {
        let npm = self.settings.auto_update_npm.then(|| self.update_self());

        self.refresh_installed();

        let settings = self.settings;
        let targets = settings
            .targets
            .iter()
            .map(|target| self.update_target(target))
            .collect();

        UpdateReport { npm, targets }
    }

    /// Update npm itself when the registry has a newer release.
    #[tracing::instrument(skip(self))]
    pub fn update_self(&self) -> TargetReport {
        println!("\n-- npm itself --");

        let local = self.npm.own_version();
        let latest = self.npm.latest_version("npm");
        println!("Current npm version: {}", local.as_deref().unwrap_or("Unknown"));
        println!("Latest npm version: {}", latest.as_deref().unwrap_or("Unknown"));

        let mut report = TargetReport {
            display: "npm".to_string(),
            installed_name: local.as_ref().map(|_| "npm".to_string()),
            installed_version: local,
            registry_name: latest.as_ref().map(|_| NPM_SELF_SPEC.to_string()),
            latest_version: latest,
            outcome: Outcome::Unresolved,
        };

        if report.latest_version.is_none() {
            println!("Warning: could not resolve the latest npm version.");
            return report;
        }

        if !is_outdated(
            report.installed_version.as_deref(),
            report.latest_version.as_deref(),
        ) {
            println!("npm is current.");
            report.outcome = Outcome::UpToDate;
            return report;
        }

        let step = self.install(NPM_SELF_SPEC, "npm update required");
        report.outcome = Self::finish(step, |summary| {
            let now_installed = self.npm.own_version();
            println!(
                "npm updated to {}",
                now_installed.as_deref().unwrap_or("Unknown")
            );
            Outcome::Updated {
                summary,
                now_installed,
            }
        });
        report
    }

    /// Bring one target up to date.
    #[tracing::instrument(skip(self, target), fields(target = %target.display))]
    pub fn update_target(&mut self, target: &Target) -> TargetReport {
        let display = &target.display;
        println!("\n-- {} --", display);

        let installed = target
            .candidates
            .iter()
            .find_map(|name| self.installed.get(name).map(|v| (name.clone(), v.clone())));

        let latest = target.candidates.iter().find_map(|name| {
            self.npm
                .latest_version(name)
                .map(|version| (name.clone(), version))
        });

        let (installed_name, installed_version) = installed.unzip();
        let (registry_name, latest_version) = latest.unzip();

        if let (Some(installed), Some(registry)) = (&installed_name, &registry_name) {
            if installed != registry {
                debug!(
                    "{} is installed as {} but resolved in the registry as {}",
                    display, installed, registry
                );
            }
        }

        println!(
            "Current {} version: {}",
            display,
            installed_version.as_deref().unwrap_or("Not installed")
        );
        println!(
            "Latest {} version: {}",
            display,
            latest_version.as_deref().unwrap_or("Unknown")
        );

        let mut report = TargetReport {
            display: display.clone(),
            installed_name,
            installed_version,
            registry_name,
            latest_version,
            outcome: Outcome::Unresolved,
        };

        let Some(registry_name) = report.registry_name.clone() else {
            println!("Warning: could not resolve latest registry version. Check package name.");
            return report;
        };

        if !is_outdated(
            report.installed_version.as_deref(),
            report.latest_version.as_deref(),
        ) {
            println!("Already up to date.");
            report.outcome = Outcome::UpToDate;
            return report;
        }

        let step = self.install(&registry_name, "Update required");
        report.outcome = Self::finish(step, |summary| {
            self.refresh_installed();
            let now_installed = self.installed.get(&registry_name).cloned();
            println!(
                "Now installed: {} {}",
                display,
                now_installed.as_deref().unwrap_or("Unknown")
            );
            Outcome::Updated {
                summary,
                now_installed,
            }
        });
        report
    }

    fn install(&self, spec: &str, prompt: &str) -> InstallStep {
        if self.settings.dry_run {
            println!("Update available (dry run, not installed).");
            return InstallStep::DryRun;
        }

        if self.settings.confirm_before_update {
            let confirmed = self.runtime.confirm(prompt).unwrap_or_else(|e| {
                warn!("Failed to read confirmation: {:#}", e);
                false
            });
            if !confirmed {
                println!("Skipped.");
                return InstallStep::Declined;
            }
        }

        println!("Installing/updating ...");
        match self.npm.install(spec) {
            Ok(summary) => {
                println!("Done.");
                println!("{}", summary);
                InstallStep::Installed(summary)
            }
            Err(e) => {
                let diagnostic = format!("{:#}", e);
                println!("Update failed:");
                if !diagnostic.is_empty() {
                    println!("{}", diagnostic);
                }
                InstallStep::Failed(diagnostic)
            }
        }
    }

    fn finish(step: InstallStep, on_installed: impl FnOnce(InstallSummary) -> Outcome) -> Outcome {
        match step {
            InstallStep::DryRun => Outcome::WouldUpdate,
            InstallStep::Declined => Outcome::Skipped,
            InstallStep::Failed(diagnostic) => Outcome::Failed(diagnostic),
            InstallStep::Installed(summary) => on_installed(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{installs, npm_env, output, script_npm};
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const LS: &[&str] = &["ls", "-g", "--depth=0", "--json"];

    fn settings(targets: Vec<Target>) -> Settings {
        Settings {
            auto_update_npm: false,
            confirm_before_update: false,
            pause_at_end: false,
            dry_run: false,
            targets,
        }
    }

    fn listing(entries: &[(&str, &str)]) -> String {
        let deps: Vec<String> = entries
            .iter()
            .map(|(name, version)| format!(r#""{}": {{"version": "{}"}}"#, name, version))
            .collect();
        format!(r#"{{"dependencies": {{{}}}}}"#, deps.join(", "))
    }

    fn view(version: &str) -> crate::runtime::CommandOutput {
        output(0, &format!(r#""{}""#, version), "")
    }

    fn not_found() -> crate::runtime::CommandOutput {
        output(1, "", "npm ERR! code E404")
    }

    fn gemini() -> Target {
        Target::new("Gemini CLI", ["@google/gemini-cli", "gemini-cli"])
    }

    #[test]
    fn test_up_to_date_issues_no_install() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, &listing(&[("@google/gemini-cli", "1.0.0")]), ""),
            ["view", "@google/gemini-cli", ..] => view("1.0.0"),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![gemini()]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        assert_eq!(report.npm, None);
        assert_eq!(report.targets.len(), 1);
        assert_eq!(report.targets[0].outcome, Outcome::UpToDate);
        assert!(installs(&calls).is_empty());
    }

    #[test]
    fn test_outdated_target_is_installed_and_reread() {
        let mut runtime = MockRuntime::new();
        let mut listings = 0;
        let calls = script_npm(&mut runtime, move |args| match args {
            a if a == LS => {
                listings += 1;
                let version = if listings == 1 { "1.0.0" } else { "1.1.0" };
                output(0, &listing(&[("@google/gemini-cli", version)]), "")
            }
            ["view", "@google/gemini-cli", ..] => view("1.1.0"),
            ["install", "-g", "@google/gemini-cli"] => {
                output(0, "\nchanged 3 packages in 2.1s\n", "")
            }
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![gemini()]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();
        let target = &report.targets[0];

        assert_eq!(target.installed_version.as_deref(), Some("1.0.0"));
        assert_eq!(target.latest_version.as_deref(), Some("1.1.0"));
        assert_eq!(
            target.outcome,
            Outcome::Updated {
                summary: InstallSummary {
                    changed: 3,
                    elapsed: Some("2.1s".into()),
                },
                now_installed: Some("1.1.0".into()),
            }
        );
        assert_eq!(installs(&calls), vec!["@google/gemini-cli"]);
        // The in-memory inventory is replaced by the re-read listing
        assert_eq!(action.installed()["@google/gemini-cli"], "1.1.0");
    }

    #[test]
    fn test_aliases_resolve_independently() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, &listing(&[("foo", "1.0.0")]), ""),
            ["view", "@scope/foo", ..] => view("2.0.0"),
            ["view", "foo", ..] => not_found(),
            ["install", "-g", "@scope/foo"] => output(0, "changed 1 package in 1s", ""),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );
        action.refresh_installed();

        let report = action.update_target(&Target::new("Foo", ["@scope/foo", "foo"]));

        assert_eq!(report.installed_name.as_deref(), Some("foo"));
        assert_eq!(report.installed_version.as_deref(), Some("1.0.0"));
        assert_eq!(report.registry_name.as_deref(), Some("@scope/foo"));
        assert_eq!(report.latest_version.as_deref(), Some("2.0.0"));
        assert_eq!(installs(&calls), vec!["@scope/foo"]);
        // The re-read listing still only knows "foo", so the new version is unknown
        assert!(matches!(
            report.outcome,
            Outcome::Updated {
                now_installed: None,
                ..
            }
        ));
    }

    #[test]
    fn test_registry_aliases_tried_in_order() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, "{}", ""),
            ["view", "@google/gemini-cli", ..] => not_found(),
            ["view", "gemini-cli", ..] => view("0.9.0"),
            ["install", "-g", "gemini-cli"] => output(0, "added 12 packages in 4s", ""),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![gemini()]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();
        let target = &report.targets[0];

        assert_eq!(target.installed_version, None);
        assert_eq!(target.registry_name.as_deref(), Some("gemini-cli"));
        assert!(matches!(
            &target.outcome,
            Outcome::Updated { summary, .. } if summary.changed == 0 && summary.elapsed.is_none()
        ));
        assert_eq!(installs(&calls), vec!["gemini-cli"]);
    }

    #[test]
    fn test_unresolved_latest_stops_target() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, &listing(&[("gemini-cli", "1.0.0")]), ""),
            ["view", ..] => not_found(),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![gemini()]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        assert_eq!(report.targets[0].outcome, Outcome::Unresolved);
        assert_eq!(report.targets[0].installed_version.as_deref(), Some("1.0.0"));
        let views: Vec<String> = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args[0] == "view")
            .map(|args| args[1].clone())
            .collect();
        assert_eq!(views, vec!["@google/gemini-cli", "gemini-cli"]);
        assert!(installs(&calls).is_empty());
    }

    #[test]
    fn test_install_failure_keeps_inventory_and_continues() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, &listing(&[("@openai/codex", "0.1.0")]), ""),
            ["view", "@google/gemini-cli", ..] => view("1.0.0"),
            ["view", "@openai/codex", ..] => view("0.1.0"),
            ["install", "-g", "@google/gemini-cli"] => {
                output(243, "", "npm ERR! code EACCES")
            }
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![
            gemini(),
            Target::new("OpenAI Codex CLI", ["@openai/codex", "openai"]),
        ]);
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        assert_eq!(
            report.targets[0].outcome,
            Outcome::Failed("npm ERR! code EACCES".into())
        );
        assert_eq!(report.targets[1].outcome, Outcome::UpToDate);
        let listings = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args[0] == "ls")
            .count();
        assert_eq!(listings, 1);
    }

    #[test]
    fn test_declined_confirmation_skips_install() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_confirm()
            .with(eq("Update required"))
            .times(1)
            .returning(|_| Ok(false));
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, "{}", ""),
            ["view", "@google/gemini-cli", ..] => view("1.0.0"),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let mut settings = settings(vec![gemini()]);
        settings.confirm_before_update = true;
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        assert_eq!(report.targets[0].outcome, Outcome::Skipped);
        assert!(installs(&calls).is_empty());
    }

    #[test]
    fn test_accepted_confirmation_installs() {
        let mut runtime = MockRuntime::new();
        runtime.expect_confirm().times(1).returning(|_| Ok(true));
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, "{}", ""),
            ["view", "@google/gemini-cli", ..] => view("1.0.0"),
            ["install", ..] => output(0, "changed 2 packages in 3s", ""),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let mut settings = settings(vec![gemini()]);
        settings.confirm_before_update = true;
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        action.run();

        assert_eq!(installs(&calls), vec!["@google/gemini-cli"]);
    }

    #[test]
    fn test_dry_run_reports_without_installing() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            a if a == LS => output(0, &listing(&[("@google/gemini-cli", "1.0.0")]), ""),
            ["view", "@google/gemini-cli", ..] => view("1.2.0"),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let mut settings = settings(vec![gemini()]);
        settings.dry_run = true;
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        assert_eq!(report.targets[0].outcome, Outcome::WouldUpdate);
        assert!(installs(&calls).is_empty());
    }

    #[test]
    fn test_self_update_runs_before_targets() {
        let mut runtime = MockRuntime::new();
        let mut version_reads = 0;
        let calls = script_npm(&mut runtime, move |args| match args {
            ["-v"] => {
                version_reads += 1;
                output(0, if version_reads == 1 { "9.8.1" } else { "10.9.0" }, "")
            }
            ["view", "npm", ..] => view("10.9.0"),
            ["install", "-g", "npm@latest"] => output(0, "changed 1 package in 6s", ""),
            a if a == LS => output(0, "{}", ""),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let mut settings = settings(vec![]);
        settings.auto_update_npm = true;
        let mut action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );

        let report = action.run();

        let npm = report.npm.unwrap();
        assert_eq!(npm.installed_version.as_deref(), Some("9.8.1"));
        assert_eq!(npm.latest_version.as_deref(), Some("10.9.0"));
        assert!(matches!(
            npm.outcome,
            Outcome::Updated { ref now_installed, .. } if now_installed.as_deref() == Some("10.9.0")
        ));
        let order: Vec<String> = calls.lock().unwrap().iter().map(|a| a[0].clone()).collect();
        assert_eq!(order, vec!["-v", "view", "install", "-v", "ls"]);
    }

    #[test]
    fn test_self_update_current_or_unresolved() {
        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            ["-v"] => output(0, "10.9.0", ""),
            ["view", "npm", ..] => view("10.9.0"),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let env = npm_env();
        let settings = settings(vec![]);
        let action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );
        assert_eq!(action.update_self().outcome, Outcome::UpToDate);
        assert!(installs(&calls).is_empty());

        let mut runtime = MockRuntime::new();
        let calls = script_npm(&mut runtime, |args| match args {
            ["-v"] => output(0, "10.9.0", ""),
            ["view", "npm", ..] => not_found(),
            other => panic!("unexpected npm call: {:?}", other),
        });
        let action = UpdateAction::new(
            &runtime,
            Npm::new(&runtime, PathBuf::from("npm"), &env),
            &settings,
        );
        let report = action.update_self();
        assert_eq!(report.outcome, Outcome::Unresolved);
        assert_eq!(report.registry_name, None);
        assert!(installs(&calls).is_empty());
    }
}
