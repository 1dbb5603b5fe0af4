//! Compiled-in settings and the environment handed to every npm invocation.

use log::debug;

use crate::runtime::Runtime;

/// Update npm itself before the configured targets.
pub const AUTO_UPDATE_NPM: bool = true;
/// Ask before every install.
pub const CONFIRM_BEFORE_UPDATE: bool = false;
/// Keep the console open at the end of a run.
pub const PAUSE_AT_END: bool = true;

/// Display name and registry aliases (in priority order) of each managed CLI.
pub const DEFAULT_TARGETS: &[(&str, &[&str])] = &[
    ("Gemini CLI", &["@google/gemini-cli", "gemini-cli"]),
    ("OpenAI Codex CLI", &["@openai/codex", "openai"]),
];

/// Variables that silence npm's "looking for funding" notice.
const FUND_VARS: [&str; 2] = ["NPM_CONFIG_FUND", "npm_config_fund"];

/// A globally installed CLI the updater keeps current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub display: String,
    pub candidates: Vec<String>,
}

impl Target {
    pub fn new<I, S>(display: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            display: display.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub auto_update_npm: bool,
    pub confirm_before_update: bool,
    pub pause_at_end: bool,
    /// Report outdated packages without installing anything.
    pub dry_run: bool,
    pub targets: Vec<Target>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_update_npm: AUTO_UPDATE_NPM,
            confirm_before_update: CONFIRM_BEFORE_UPDATE,
            pause_at_end: PAUSE_AT_END,
            dry_run: false,
            targets: DEFAULT_TARGETS
                .iter()
                .map(|(display, candidates)| Target::new(*display, candidates.iter().copied()))
                .collect(),
        }
    }
}

/// Environment overrides applied to every npm child process.
///
/// Computed once at startup with "set if absent" semantics; the parent's own
/// environment is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpmEnvironment {
    overrides: Vec<(String, String)>,
}

impl NpmEnvironment {
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Self {
        let overrides = FUND_VARS
            .iter()
            .filter(|key| runtime.env_var(key).is_err())
            .map(|key| {
                debug!("Defaulting {} to false", key);
                (key.to_string(), "false".to_string())
            })
            .collect();
        Self { overrides }
    }

    pub fn overrides(&self) -> &[(String, String)] {
        &self.overrides
    }
}
