//! Layered configuration files.
//!
//! This module handles everything between a logical file name and a typed
//! value:
//! - File access (disk or embedded) in [`source`]
//! - Format codecs in [`format`]
//! - Discovery of generic and environment files in [`locator`]
//! - Per-key merging in [`merger`]
//! - `${...}` placeholders in [`interpolation`]
//! - Field annotations in [`annotations`] and [`shape`]
//! - Loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//! use tempfile::TempDir;
//! use toolshed::config::{Annotated, Field, LocalFiles, Loader, Shape};
//! use toolshed::environment::Environment;
//!
//! #[derive(Serialize, Deserialize, Default)]
//! #[serde(default)]
//! struct Db {
//!     host: String,
//!     pool: u32,
//! }
//!
//! impl Annotated for Db {
//!     fn shape() -> Shape {
//!         Shape::Struct(vec![Field::of::<u32>("pool").default_value("4")])
//!     }
//! }
//!
//! let temp = TempDir::new().unwrap();
//! std::fs::write(temp.path().join("db.yaml"), "host: localhost").unwrap();
//! std::fs::write(temp.path().join("db.production.yaml"), "host: db.internal").unwrap();
//!
//! let loader = Loader::new(Arc::new(LocalFiles::new(temp.path())));
//! let mut db = Db::default();
//! loader.load_for(&mut db, Some(&Environment::production()), &["db"]).unwrap();
//!
//! assert_eq!(db.host, "db.internal");
//! assert_eq!(db.pool, 4);
//! ```

pub mod annotations;
pub mod format;
pub mod interpolation;
pub mod loader;
pub mod locator;
pub mod merger;
pub mod shape;
pub mod source;

pub use annotations::FieldOptions;
pub use format::{Codec, Formats, JsonCodec, TomlCodec, YamlCodec};
pub use interpolation::{has_placeholders, is_template, parse_template, render, Segment};
pub use loader::{load, ConfigFiles, EnvLookup, Loader};
pub use locator::FileLocator;
pub use merger::{merge_into, merge_layers};
pub use shape::{apply_annotations, is_zero, Annotated, Field, ScalarKind, Shape};
pub use source::{EmbeddedFiles, FileSource, LocalFiles};
