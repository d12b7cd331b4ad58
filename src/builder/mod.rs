//! Object graph construction.
//!
//! A toolbox is a tree of components. The [`Builder`] walks it depth-first,
//! making or configuring each slot from its config files, children before
//! their parent:
//! - Capabilities in [`component`]
//! - Factories for foreign types in [`registry`]
//! - The traversal in [`traversal`]
//! - The per-slot outcome tree in [`report`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tempfile::TempDir;
//! use toolshed::builder::{Builder, Component, Configurable, Fields, Outcome};
//! use toolshed::config::ConfigFiles;
//! use toolshed::environment::EnvironmentResolver;
//!
//! #[derive(Default, PartialEq)]
//! struct Cache {
//!     files: usize,
//! }
//!
//! impl Configurable for Cache {
//!     fn configure(&mut self, files: &ConfigFiles) -> anyhow::Result<()> {
//!         self.files = files.paths().len();
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Cache {
//!     fn configurable(&mut self) -> Option<&mut dyn Configurable> {
//!         Some(self)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Toolbox {
//!     cache: Cache,
//! }
//!
//! impl Component for Toolbox {
//!     fn fields(&mut self, fields: &mut Fields<'_>) -> toolshed::Result<()> {
//!         fields.component("cache", &mut self.cache)
//!     }
//! }
//!
//! let temp = TempDir::new().unwrap();
//! std::fs::write(temp.path().join("cache.yaml"), "size: 10").unwrap();
//! std::fs::write(temp.path().join("cache.staging.yaml"), "size: 20").unwrap();
//!
//! let resolver = EnvironmentResolver::default();
//! resolver.set_manual_tag("staging");
//! let builder = Builder::local(temp.path()).with_resolver(Arc::new(resolver));
//!
//! let mut toolbox = Toolbox::default();
//! let report = builder.build(&mut toolbox).unwrap();
//!
//! assert_eq!(toolbox.cache.files, 2);
//! assert_eq!(report.outcome("cache"), Some(Outcome::Configured));
//! ```

pub mod component;
pub mod registry;
pub mod report;
pub mod traversal;

pub use component::{Component, Configurable, Constructor, Instance, Member};
pub use registry::{Factory, FactoryRegistry};
pub use report::{short_type_name, BuildReport, Outcome, ReportNode, ReportOptions};
pub use traversal::{Builder, Fields};
