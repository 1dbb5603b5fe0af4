//! Package version handling.

mod version;

pub use version::{Prerelease, VersionTuple, is_outdated};
