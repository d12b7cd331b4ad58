//! Show command implementation.
//!
//! The `toolshed show` command loads the located files for a set of
//! logical names and prints the merged result.

use std::io::Write;

use crate::cli::args::{OutputFormat, ShowArgs};
use crate::error::{Error, Result};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The show command implementation.
pub struct ShowCommand {
    args: ShowArgs,
}

impl ShowCommand {
    pub fn new(args: ShowArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &ShowArgs {
        &self.args
    }
}

impl Command for ShowCommand {
    fn execute(&self, context: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        let environment = (!self.args.generic_only).then(|| context.environment());
        let files = context
            .locator()
            .locate(&self.args.names, environment.as_ref())?;
        let merged = context.loader().load_value(&files)?;

        match self.args.format {
            OutputFormat::Json => {
                let json =
                    serde_json::to_string_pretty(&merged).map_err(|e| Error::Other(e.into()))?;
                writeln!(out, "{}", json)?;
            }
            OutputFormat::Yaml => {
                for file in &files {
                    writeln!(out, "# {}", file.display())?;
                }
                let yaml = serde_yaml::to_string(&merged).map_err(|e| Error::Other(e.into()))?;
                write!(out, "{}", yaml)?;
            }
        }

        Ok(CommandResult::success())
    }
}
