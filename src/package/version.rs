//! Version comparison for registry packages.
//!
//! npm versions are compared as `(major, minor, patch, prerelease)` tuples.
//! This is deliberately looser than full semver precedence: pre-release tags
//! compare as plain strings.

use std::fmt;

/// Pre-release part of a version. A release sorts above every tagged pre-release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prerelease {
    Tag(String),
    /// Rank of an unparsable version: above any tag, below a release.
    Malformed,
    Release,
}

/// Comparable form of a version string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTuple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Prerelease,
}

impl VersionTuple {
    /// Value every unparsable version collapses to.
    pub const MALFORMED: VersionTuple = VersionTuple {
        major: 0,
        minor: 0,
        patch: 0,
        prerelease: Prerelease::Malformed,
    };

    /// Parse a version string such as `1.2.3` or `2.0.0-beta.1`.
    ///
    /// Missing numeric components default to zero. Build metadata (`+...`) is
    /// ignored. Any non-numeric component yields [`VersionTuple::MALFORMED`].
    pub fn parse(version: &str) -> Self {
        let version = version.trim();
        let version = version.split_once('+').map_or(version, |(v, _)| v);
        let (core, pre) = match version.split_once('-') {
            Some((core, pre)) => (core, pre),
            None => (version, ""),
        };

        let mut parts = core.split('.');
        let mut next = || -> Option<u64> {
            match parts.next() {
                Some(part) => part.parse().ok(),
                None => Some(0),
            }
        };

        let (Some(major), Some(minor), Some(patch)) = (next(), next(), next()) else {
            return Self::MALFORMED;
        };

        let prerelease = if pre.is_empty() {
            Prerelease::Release
        } else {
            Prerelease::Tag(pre.to_string())
        };

        Self {
            major,
            minor,
            patch,
            prerelease,
        }
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Prerelease::Tag(tag) = &self.prerelease {
            write!(f, "-{}", tag)?;
        }
        Ok(())
    }
}

/// Decide whether `installed` needs updating to `latest`.
///
/// - an unknown `latest` can never be judged, so it is never outdated
/// - a missing `installed` version always needs an install
pub fn is_outdated(installed: Option<&str>, latest: Option<&str>) -> bool {
    match (installed, latest) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(installed), Some(latest)) => {
            VersionTuple::parse(installed) < VersionTuple::parse(latest)
        }
    }
}
