//! Per-field options.
//!
//! Fields carry a small typed option set. Options can be built directly or
//! parsed once from the compact annotation strings:
//!
//! - build-time: `-` skips the field, otherwise `a|b,c` lists extra logical
//!   file names (`a`, `b` and `c`)
//! - config-time: `env=VAR`, `default=LITERAL` and `required`, comma
//!   separated (commas inside brackets, braces or quotes belong to the
//!   literal)

use crate::error::{Error, Result};

/// Options attached to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Leave the field untouched.
    pub skip: bool,
    /// Logical file names searched in addition to the field name.
    pub extra_files: Vec<String>,
    /// Environment variable overriding the loaded value.
    pub env_var: Option<String>,
    /// Literal decoded into the field when it is still zero.
    pub default_literal: Option<String>,
    /// Fail when the field is still zero after env and default.
    pub required: bool,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.extra_files.push(name.into());
        self
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Parse a build-time annotation.
    ///
    /// # Example
    ///
    /// ```
    /// use toolshed::config::FieldOptions;
    ///
    /// let opts = FieldOptions::parse_build("media/pictures|media/overrides,shared");
    /// assert_eq!(opts.extra_files, ["media/pictures", "media/overrides", "shared"]);
    /// assert!(FieldOptions::parse_build("-").skip);
    /// ```
    pub fn parse_build(tag: &str) -> Self {
        let tag = tag.trim();
        if tag == "-" {
            return Self::new().skip();
        }

        let extra_files = tag
            .split(',')
            .flat_map(|group| group.split('|'))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Self {
            extra_files,
            ..Self::default()
        }
    }

    /// Parse a config-time annotation for `field`.
    ///
    /// # Errors
    ///
    /// Returns `Tag` for unknown keys and for `env` or `default` without a
    /// value.
    ///
    /// # Example
    ///
    /// ```
    /// use toolshed::config::FieldOptions;
    ///
    /// let opts = FieldOptions::parse_config("port", "env=PORT,default=80,required").unwrap();
    /// assert_eq!(opts.env_var.as_deref(), Some("PORT"));
    /// assert_eq!(opts.default_literal.as_deref(), Some("80"));
    /// assert!(opts.required);
    /// ```
    pub fn parse_config(field: &str, tag: &str) -> Result<Self> {
        let mut opts = Self::default();

        for token in split_top_level(tag) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v)),
                None => (token, None),
            };

            match (key, value) {
                ("required", None) => opts.required = true,
                ("env", Some(var)) if !var.trim().is_empty() => {
                    opts.env_var = Some(var.trim().to_string())
                }
                ("env", _) => return Err(malformed(field, "env needs a variable name: `env=VAR`")),
                ("default", Some(literal)) => opts.default_literal = Some(literal.to_string()),
                ("default", None) => {
                    return Err(malformed(field, "default needs a value: `default=LITERAL`"))
                }
                _ => return Err(malformed(field, &format!("unknown annotation `{}`", token))),
            }
        }

        Ok(opts)
    }
}

fn malformed(field: &str, message: &str) -> Error {
    Error::Tag {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Split on commas that are not nested in brackets, braces or quotes.
fn split_top_level(tag: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '{') => depth += 1,
            (None, ']' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&tag[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tag[start..]);
    parts
}
