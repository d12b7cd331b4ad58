//! Structural description of configuration types.
//!
//! A [`Shape`] tells the loader where annotated fields live inside a
//! destination type, so the post-processing pass (env overrides, defaults,
//! required checks) can walk the merged value tree before it is decoded
//! into the typed destination.
//!
//! Leaf types and containers get their shape from the blanket
//! [`Annotated`] impls in this module. Structs list their fields:
//!
//! ```
//! use toolshed::config::{Annotated, Field, Shape};
//!
//! #[derive(serde::Serialize, serde::Deserialize, Default)]
//! struct Database {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Annotated for Database {
//!     fn shape() -> Shape {
//!         Shape::Struct(vec![
//!             Field::of::<String>("host").env("DB_HOST").default_value("localhost"),
//!             Field::of::<u16>("port").tag("env=DB_PORT,default=5432"),
//!         ])
//!     }
//! }
//! ```
//!
//! Field names are the serialized keys, so `#[serde(rename)]` must be
//! mirrored here. Fields without annotations or nested structure can be
//! left out. Self-referential types should describe the recursive field
//! with [`Field::opaque`].

use crate::config::annotations::FieldOptions;
use crate::error::{Error, Result};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// How a scalar literal is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Literals are taken verbatim as strings.
    Text,
    /// Literals are parsed as YAML scalars (numbers, booleans...).
    Value,
}

/// Shape of a configuration type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Struct(Vec<Field>),
    /// An optional value; null is skipped by the post-processing pass.
    Pointer(Box<Shape>),
    Sequence(Box<Shape>),
    Mapping(Box<Shape>),
    Scalar(ScalarKind),
}

impl Shape {
    /// The shape of `T`.
    pub fn of<T: Annotated>() -> Self {
        T::shape()
    }

    /// A struct with nothing to post-process.
    pub fn empty() -> Self {
        Shape::Struct(Vec::new())
    }

    /// Check every field's annotations.
    ///
    /// # Errors
    ///
    /// Returns `Tag` for the first field whose annotation failed to parse.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("")
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        match self {
            Shape::Struct(fields) => {
                for field in fields {
                    let field_path = join(path, &field.name);
                    if let Some(message) = &field.invalid {
                        return Err(Error::Tag {
                            field: field_path,
                            message: message.clone(),
                        });
                    }
                    field.shape.validate_at(&field_path)?;
                }
                Ok(())
            }
            Shape::Pointer(inner) => inner.validate_at(path),
            Shape::Sequence(inner) => inner.validate_at(&format!("{}[]", path)),
            Shape::Mapping(inner) => inner.validate_at(&join(path, "*")),
            Shape::Scalar(_) => Ok(()),
        }
    }

    /// Whether `value` is the zero value of a type of this shape.
    ///
    /// An optional value is zero only when it is null, whatever it holds.
    pub fn is_zero(&self, value: &Value) -> bool {
        match (self, value) {
            (Shape::Pointer(_), value) => value.is_null(),
            (Shape::Struct(fields), Value::Mapping(map)) => map.iter().all(|(key, item)| {
                fields
                    .iter()
                    .find(|field| key.as_str() == Some(field.name.as_str()))
                    .map_or_else(|| is_zero(item), |field| field.shape.is_zero(item))
            }),
            (_, value) => is_zero(value),
        }
    }

    fn literal_kind(&self) -> ScalarKind {
        match self {
            Shape::Scalar(kind) => *kind,
            Shape::Pointer(inner) => inner.literal_kind(),
            _ => ScalarKind::Value,
        }
    }

    /// Decode an annotation literal or env value into a value of this shape.
    fn decode_literal(&self, literal: &str, origin: impl FnOnce() -> String) -> Result<Value> {
        match self.literal_kind() {
            ScalarKind::Text => Ok(Value::String(literal.to_string())),
            ScalarKind::Value => serde_yaml::from_str(literal).map_err(|e| Error::Decode {
                source_name: origin(),
                message: e.to_string(),
            }),
        }
    }
}

/// A named field of a struct shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub options: FieldOptions,
    pub shape: Shape,
    invalid: Option<String>,
}

impl Field {
    /// A field named `name` holding a `T`.
    pub fn of<T: Annotated>(name: impl Into<String>) -> Self {
        Self::with_shape(name, T::shape())
    }

    pub fn with_shape(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            options: FieldOptions::default(),
            shape,
            invalid: None,
        }
    }

    /// A field whose contents are not descended into.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::with_shape(name, Shape::Scalar(ScalarKind::Value))
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.options.env_var = Some(var.into());
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.options.default_literal = Some(literal.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Apply a config-time annotation such as `env=PORT,default=80`.
    ///
    /// A malformed annotation is reported when the shape is validated.
    pub fn tag(mut self, tag: &str) -> Self {
        match FieldOptions::parse_config(&self.name, tag) {
            Ok(parsed) => {
                if parsed.env_var.is_some() {
                    self.options.env_var = parsed.env_var;
                }
                if parsed.default_literal.is_some() {
                    self.options.default_literal = parsed.default_literal;
                }
                self.options.required |= parsed.required;
            }
            Err(Error::Tag { message, .. }) => self.invalid = Some(message),
            Err(e) => self.invalid = Some(e.to_string()),
        }
        self
    }
}

/// Types that can describe their own shape.
pub trait Annotated {
    fn shape() -> Shape;
}

macro_rules! scalar_shape {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(impl Annotated for $ty {
            fn shape() -> Shape {
                Shape::Scalar($kind)
            }
        })+
    };
}

scalar_shape!(ScalarKind::Text => String, PathBuf);
scalar_shape!(ScalarKind::Value =>
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    Value, serde_json::Value,
);

impl<T: Annotated> Annotated for Option<T> {
    fn shape() -> Shape {
        Shape::Pointer(Box::new(T::shape()))
    }
}

impl<T: Annotated> Annotated for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Annotated> Annotated for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(Box::new(T::shape()))
    }
}

impl<K, V: Annotated, S> Annotated for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Mapping(Box::new(V::shape()))
    }
}

impl<K, V: Annotated> Annotated for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Mapping(Box::new(V::shape()))
    }
}

/// Whether a value is the zero value of its type.
///
/// Null, `false`, `0`, empty strings and empty sequences are zero, and so
/// is a mapping whose values are all zero.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.values().all(is_zero),
        Value::Tagged(tagged) => is_zero(&tagged.value),
    }
}

/// Apply env overrides, defaults and required checks across `value`.
///
/// `path` prefixes field names in errors. `env` looks up environment
/// variables.
///
/// # Errors
///
/// Returns `Tag` naming the field when a required value is still zero and
/// `Decode` when an env value or default literal cannot be decoded.
pub fn apply_annotations(
    value: &mut Value,
    shape: &Shape,
    path: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<()> {
    match shape {
        Shape::Struct(fields) => {
            let Value::Mapping(map) = value else {
                return Ok(());
            };
            for field in fields {
                let field_path = join(path, &field.name);
                let key = Value::String(field.name.clone());
                let present = map.contains_key(&key);
                let slot = map.entry(key.clone()).or_insert(Value::Null);

                apply_field(slot, field, &field_path, env)?;

                if !present && slot.is_null() {
                    map.remove(&key);
                }
            }
            Ok(())
        }
        Shape::Pointer(inner) => {
            if value.is_null() {
                return Ok(());
            }
            apply_annotations(value, inner, path, env)
        }
        Shape::Sequence(inner) => {
            if let Value::Sequence(items) = value {
                for (i, item) in items.iter_mut().enumerate() {
                    apply_annotations(item, inner, &format!("{}[{}]", path, i), env)?;
                }
            }
            Ok(())
        }
        Shape::Mapping(inner) => {
            if let Value::Mapping(map) = value {
                for (key, item) in map.iter_mut() {
                    apply_annotations(item, inner, &join(path, &key_label(key)), env)?;
                }
            }
            Ok(())
        }
        Shape::Scalar(_) => Ok(()),
    }
}

fn apply_field(
    slot: &mut Value,
    field: &Field,
    path: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<()> {
    let options = &field.options;

    if let Some(var) = &options.env_var {
        if let Some(raw) = env(var).filter(|v| !v.is_empty()) {
            *slot = field
                .shape
                .decode_literal(&raw, || format!("${} for {}", var, path))?;
        }
    }

    if field.shape.is_zero(slot) {
        if let Some(literal) = &options.default_literal {
            *slot = field
                .shape
                .decode_literal(literal, || format!("default for {}", path))?;
        }
    }

    if options.required && field.shape.is_zero(slot) {
        return Err(Error::Tag {
            field: path.to_string(),
            message: "required value is missing".to_string(),
        });
    }

    apply_annotations(slot, &field.shape, path, env)
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
