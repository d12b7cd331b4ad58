//! Locate command implementation.
//!
//! The `toolshed locate` command lists the files that would be loaded for
//! a set of logical names, in load order.

use std::io::Write;

use crate::cli::args::LocateArgs;
use crate::error::Result;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The locate command implementation.
pub struct LocateCommand {
    args: LocateArgs,
}

impl LocateCommand {
    pub fn new(args: LocateArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &LocateArgs {
        &self.args
    }
}

impl Command for LocateCommand {
    fn execute(&self, context: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        let environment = (!self.args.generic_only).then(|| context.environment());
        let files = context
            .locator()
            .locate(&self.args.names, environment.as_ref())?;

        for file in &files {
            writeln!(out, "{}", file.display())?;
        }
        Ok(CommandResult::success())
    }
}
