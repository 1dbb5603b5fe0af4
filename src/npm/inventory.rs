//! Parsing of npm's machine-readable listing and `view` output.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Globally installed packages: name -> installed version.
pub type InstalledPackages = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
}

/// Parse the JSON printed by `npm ls -g --depth=0 --json`.
///
/// Empty output is an empty listing. Entries without a string `version`
/// (e.g. missing or invalid installs) are skipped.
pub fn parse_listing(json: &str) -> Result<InstalledPackages> {
    let json = if json.trim().is_empty() { "{}" } else { json };
    let listing: Listing =
        serde_json::from_str(json).context("global package listing is not a JSON object")?;

    Ok(listing
        .dependencies
        .into_iter()
        .filter_map(|(name, info)| match info.get("version") {
            Some(Value::String(version)) => Some((name, version.clone())),
            _ => None,
        })
        .collect())
}

/// Parse the output of `npm view <pkg> version --json`.
pub fn parse_view_version(output: &str) -> Option<String> {
    let output = output.trim();
    if output.is_empty() {
        return None;
    }

    let version = match serde_json::from_str::<Value>(output) {
        Ok(Value::String(s)) => s.trim().to_string(),
        // A range query lists every match, oldest first
        Ok(Value::Array(items)) => items
            .iter()
            .rev()
            .find_map(|item| item.as_str())?
            .trim()
            .to_string(),
        Ok(Value::Null) => return None,
        Ok(other) => other.to_string(),
        Err(_) => output.trim_matches('"').trim().to_string(),
    };

    (!version.is_empty()).then_some(version)
}
