pub mod application;
pub mod commands;
pub mod config;
pub mod npm;
pub mod package;
pub mod runtime;
