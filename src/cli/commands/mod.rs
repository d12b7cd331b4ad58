//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Every command receives the same
//! [`CommandContext`] built from the global flags, so environment detection
//! and file matching behave identically across `env`, `locate` and `show`.

pub mod dispatcher;
pub mod env;
pub mod locate;
pub mod show;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
