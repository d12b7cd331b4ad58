//! Command-line interface for toolshed.
//!
//! The binary is a diagnostic front end over the library: it shows which
//! environment is active, which files a logical name resolves to and what
//! they merge into.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, EnvArgs, LocateArgs, OutputFormat, ShowArgs};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
