//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandContext`] for the state shared by every command
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::config::{FileLocator, LocalFiles, Loader};
use crate::environment::{Environment, EnvironmentResolver, GitRepository};
use crate::error::Result;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing its report to `out`.
    fn execute(&self, context: &CommandContext, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Exit code to use (0 for success).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self { exit_code: 0 }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Config directory, resolver and file matching shared by commands.
#[derive(Debug)]
pub struct CommandContext {
    config_dir: PathBuf,
    resolver: Arc<EnvironmentResolver>,
    case_sensitive: bool,
    colored: bool,
}

impl CommandContext {
    pub fn new(config_dir: impl Into<PathBuf>, resolver: Arc<EnvironmentResolver>) -> Self {
        Self {
            config_dir: config_dir.into(),
            resolver,
            case_sensitive: false,
            colored: false,
        }
    }

    /// Build the context described by the global flags.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut resolver = EnvironmentResolver::default().with_system_variable(&cli.env_var);
        if !cli.no_git {
            resolver = resolver.with_vcs(Arc::new(GitRepository::open(&cli.config_dir)));
        }
        if let Some(tag) = &cli.env {
            resolver.set_manual_tag(tag);
        }

        Self::new(&cli.config_dir, Arc::new(resolver))
            .case_sensitive(cli.case_sensitive)
            .colored(!cli.no_color && console::colors_enabled())
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn colored(mut self, enabled: bool) -> Self {
        self.colored = enabled;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn resolver(&self) -> &EnvironmentResolver {
        &self.resolver
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    pub fn environment(&self) -> Environment {
        self.resolver.current()
    }

    pub fn locator(&self) -> FileLocator {
        FileLocator::local(&self.config_dir).case_sensitive(self.case_sensitive)
    }

    pub fn loader(&self) -> Loader {
        Loader::new(Arc::new(LocalFiles::new(&self.config_dir)))
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, command: &Commands, out: &mut dyn Write) -> Result<CommandResult> {
        match command {
            Commands::Env(args) => super::env::EnvCommand::new(args.clone()).execute(&self.context, out),
            Commands::Locate(args) => {
                super::locate::LocateCommand::new(args.clone()).execute(&self.context, out)
            }
            Commands::Show(args) => super::show::ShowCommand::new(args.clone()).execute(&self.context, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::EnvArgs;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.is_success());
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn context_from_flags() {
        use clap::Parser;
        let cli = Cli::parse_from(["toolshed", "--no-git", "--env", "dev", "env"]);
        let context = CommandContext::from_cli(&cli);
        assert_eq!(context.config_dir(), Path::new("."));
        assert_eq!(context.environment().tag(), "development");
        assert!(context.resolver().vcs_info().is_none());
    }

    #[test]
    fn dispatches_env_command() {
        let resolver = EnvironmentResolver::default();
        resolver.set_manual_tag("staging");
        let dispatcher = CommandDispatcher::new(CommandContext::new(".", Arc::new(resolver)));

        let mut out = Vec::new();
        let result = dispatcher
            .dispatch(&Commands::Env(EnvArgs::default()), &mut out)
            .unwrap();
        assert!(result.is_success());
        assert!(String::from_utf8(out).unwrap().contains("staging"));
    }
}
