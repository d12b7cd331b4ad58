//! Capabilities a type can offer to the builder.
//!
//! A type takes part in a build by implementing [`Component`]. Each of the
//! three queries is optional:
//!
//! - [`Component::constructor`]: the type makes new instances of itself
//!   from its config files
//! - [`Component::configurable`]: an existing instance configures itself
//!   in place
//! - [`Component::fields`]: the type exposes child slots to traverse
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use toolshed::builder::{Component, Configurable, Fields};
//! use toolshed::config::{Annotated, ConfigFiles, Shape};
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Mailer {
//!     host: String,
//! }
//!
//! impl Annotated for Mailer {
//!     fn shape() -> Shape {
//!         Shape::empty()
//!     }
//! }
//!
//! impl Configurable for Mailer {
//!     fn configure(&mut self, files: &ConfigFiles) -> anyhow::Result<()> {
//!         files.load(self)?;
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Mailer {
//!     fn configurable(&mut self) -> Option<&mut dyn Configurable> {
//!         Some(self)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Services {
//!     mailer: Mailer,
//! }
//!
//! impl Component for Services {
//!     fn fields(&mut self, fields: &mut Fields<'_>) -> toolshed::Result<()> {
//!         fields.component("mailer", &mut self.mailer)
//!     }
//! }
//! ```

use crate::builder::traversal::Fields;
use crate::config::{ConfigFiles, FieldOptions};
use crate::error::Result;
use std::any::{type_name, Any};
use std::fmt;

/// Makes a new instance of a type from its config files.
pub type Constructor = fn(&ConfigFiles) -> anyhow::Result<Instance>;

/// A value produced by a constructor or registered factory.
///
/// The builder accepts an instance holding either the slot's type `T` or a
/// `Box<T>`; anything else is a construction error.
pub struct Instance {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the type the instance was created with.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Take the value out as a `T`, or give the instance back.
    pub(crate) fn downcast<T: Any>(self) -> std::result::Result<T, Instance> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => match value.downcast::<Box<T>>() {
                Ok(boxed) => Ok(**boxed),
                Err(value) => Err(Instance { value, type_name }),
            },
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// In-place configuration from located files.
pub trait Configurable {
    fn configure(&mut self, files: &ConfigFiles) -> anyhow::Result<()>;
}

/// A node of the object graph.
pub trait Component: Any + Send {
    /// How to make a new instance of this type, if it can.
    fn constructor() -> Option<Constructor>
    where
        Self: Sized,
    {
        None
    }

    /// This instance as a configure target, if it is one.
    fn configurable(&mut self) -> Option<&mut dyn Configurable> {
        None
    }

    /// Offer child slots to the builder.
    ///
    /// Children are resolved before this value is configured.
    fn fields(&mut self, fields: &mut Fields<'_>) -> Result<()> {
        let _ = fields;
        Ok(())
    }
}

/// A child slot: its name and build-time options.
///
/// The slot's config files are its own name followed by any extra names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    name: String,
    options: FieldOptions,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: FieldOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Also load `name` (a logical file name, extension optional).
    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.options = self.options.file(name);
        self
    }

    pub fn skip(mut self) -> Self {
        self.options = self.options.skip();
        self
    }

    /// Apply a build-time annotation: `-` or `a|b,c`.
    pub fn tag(mut self, tag: &str) -> Self {
        let parsed = FieldOptions::parse_build(tag);
        self.options.skip |= parsed.skip;
        self.options.extra_files.extend(parsed.extra_files);
        self
    }

    /// Logical file names searched for this slot.
    pub fn files(&self) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(self.options.extra_files.iter().cloned())
            .collect()
    }
}

impl From<&str> for Member {
    fn from(name: &str) -> Self {
        Member::new(name)
    }
}

impl From<String> for Member {
    fn from(name: String) -> Self {
        Member::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Cache(u32);

    #[test]
    fn instance_downcasts_value() {
        let instance = Instance::new(Cache(3));
        assert!(instance.type_name().ends_with("Cache"));
        assert_eq!(instance.downcast::<Cache>().unwrap(), Cache(3));
    }

    #[test]
    fn instance_downcasts_boxed_value() {
        let instance = Instance::new(Box::new(Cache(4)));
        assert_eq!(instance.downcast::<Cache>().unwrap(), Cache(4));
    }

    #[test]
    fn instance_of_other_type_is_returned() {
        let instance = Instance::new(String::from("nope"));
        let back = instance.downcast::<Cache>().unwrap_err();
        assert_eq!(back.type_name(), "alloc::string::String");
    }

    #[test]
    fn member_files_start_with_name() {
        let member = Member::from("pictures").file("media/pictures").tag("media/overrides|shared");
        assert_eq!(
            member.files(),
            ["pictures", "media/pictures", "media/overrides", "shared"]
        );
        assert!(!member.options().skip);
    }

    #[test]
    fn member_skip_tag() {
        assert!(Member::new("omitted").tag("-").options().skip);
        assert!(Member::new("omitted").skip().options().skip);
    }
}
