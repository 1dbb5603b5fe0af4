mod update;

pub use update::{RunStatus, pause_before_exit, update};
