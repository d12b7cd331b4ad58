//! Env command implementation.
//!
//! The `toolshed env` command shows the active environment, how it was
//! detected and which environments can be matched.

use std::io::Write;

use console::Style;

use crate::cli::args::EnvArgs;
use crate::error::{Error, Result};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The env command implementation.
pub struct EnvCommand {
    args: EnvArgs,
}

impl EnvCommand {
    pub fn new(args: EnvArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &EnvArgs {
        &self.args
    }
}

impl Command for EnvCommand {
    fn execute(&self, context: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        let resolver = context.resolver();
        let active = resolver.current();
        let environments = resolver.environments();
        let vcs = resolver.vcs_info();

        if self.args.json {
            let report = serde_json::json!({
                "environment": active.tag(),
                "inferred_by": active.inferred_by().map(|i| i.to_string()),
                "environments": environments
                    .iter()
                    .map(|env| serde_json::json!({ "tag": env.tag(), "pattern": env.pattern() }))
                    .collect::<Vec<_>>(),
                "vcs": vcs.as_ref().map(|info| serde_json::json!({
                    "branch": info.branch,
                    "commit": info.commit,
                    "tag": info.tag,
                    "build": info.build,
                })),
            });
            let json = serde_json::to_string_pretty(&report).map_err(|e| Error::Other(e.into()))?;
            writeln!(out, "{}", json)?;
            return Ok(CommandResult::success());
        }

        let key = if context.is_colored() {
            Style::new().bold()
        } else {
            Style::new()
        };
        let highlight = if context.is_colored() {
            Style::new().green().bold()
        } else {
            Style::new()
        };

        writeln!(
            out,
            "{} {}",
            key.apply_to("Environment:"),
            highlight.apply_to(active.tag())
        )?;
        if let Some(inference) = active.inferred_by() {
            writeln!(out, "{} {}", key.apply_to("Detected:"), inference)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", key.apply_to("Environments:"))?;
        for env in &environments {
            let marker = if env.tag() == active.tag() { "*" } else { " " };
            writeln!(out, " {} {:<12} {}", marker, env.tag(), env.pattern())?;
        }

        if let Some(info) = vcs {
            writeln!(out)?;
            writeln!(out, "{}", key.apply_to("VCS:"))?;
            writeln!(out, "{}", info)?;
        }

        Ok(CommandResult::success())
    }
}
