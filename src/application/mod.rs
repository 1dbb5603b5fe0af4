//! Application layer - use cases that coordinate the npm client.

mod update;

pub use update::{NPM_SELF_SPEC, Outcome, TargetReport, UpdateAction, UpdateReport};
