//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use crate::environment::DEFAULT_SYSTEM_VARIABLE;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Toolshed - inspect environment detection and layered config files.
#[derive(Debug, Parser)]
#[command(name = "toolshed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the config files
    #[arg(short, long, global = true, default_value = ".", env = "TOOLSHED_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Force the environment tag (e.g. production, release/1.2)
    #[arg(short, long, global = true, value_name = "TAG")]
    pub env: Option<String>,

    /// System variable consulted for the environment tag
    #[arg(long, global = true, default_value = DEFAULT_SYSTEM_VARIABLE, value_name = "NAME")]
    pub env_var: String,

    /// Do not use the git branch to detect the environment
    #[arg(long, global = true)]
    pub no_git: bool,

    /// Match config file names case-sensitively
    #[arg(long, global = true)]
    pub case_sensitive: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the active environment and how it was detected
    Env(EnvArgs),

    /// List the config files found for logical names
    Locate(LocateArgs),

    /// Show the merged config for logical names
    Show(ShowArgs),
}

/// Arguments for the `env` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `locate` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LocateArgs {
    /// Logical file names, extension optional (e.g. db, services/cache)
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Ignore environment-specific files
    #[arg(long)]
    pub generic_only: bool,
}

/// Arguments for the `show` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ShowArgs {
    /// Logical file names, extension optional
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Ignore environment-specific files
    #[arg(long)]
    pub generic_only: bool,
}

/// Output format for `show`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}
