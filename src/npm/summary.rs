//! Best-effort reading of npm's install completion message.
//!
//! npm only prints a human-readable line such as `changed 3 packages in 2s`,
//! whose wording differs between npm releases. Parsing never fails: anything
//! unrecognised yields zero changed packages and an unknown duration.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static CHANGED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)changed\s+(\d+)\s+packages?(?:.*?in\s+([0-9.]+\w+))?")
        .expect("valid completion pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub changed: u32,
    /// Duration token as printed by npm, e.g. `2.1s` or `850ms`.
    pub elapsed: Option<String>,
}

impl InstallSummary {
    pub fn parse(output: &str) -> Self {
        let Some(caps) = CHANGED_RE.captures(output) else {
            return Self::default();
        };

        Self {
            changed: caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
            elapsed: caps.get(2).map(|m| m.as_str().to_string()),
        }
    }
}

impl fmt::Display for InstallSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.elapsed {
            Some(elapsed) => write!(f, "Changed packages: {} (in {})", self.changed, elapsed),
            None => write!(f, "Changed packages: {}", self.changed),
        }
    }
}
