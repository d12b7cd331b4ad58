//! Toolshed - environment-aware layered configuration.
//!
//! Toolshed builds a "toolbox" of components from config files. Each
//! component's files are found by naming convention (`db.yaml`, then
//! `db.production.yaml` for the active environment), merged key by key and
//! handed to the component to construct or configure itself.
//!
//! # Modules
//!
//! - [`builder`] - Depth-first construction of component trees
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - File discovery, layered loading and field annotations
//! - [`environment`] - Environment definition and detection
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use toolshed::environment::EnvironmentResolver;
//!
//! let resolver = EnvironmentResolver::default();
//! resolver.set_manual_tag("feature/search");
//! assert_eq!(resolver.current().tag(), "development");
//! ```
//!
//! For building toolboxes, see [`builder`] and the integration tests.

pub mod builder;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;

pub use error::{Error, Result};
