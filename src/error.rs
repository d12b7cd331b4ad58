//! Error types for toolshed operations.
//!
//! This module defines [`Error`], the error type returned by locating,
//! loading and building, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every variant aborts the current `locate` / `load` / `build` call
//! - Nothing is retried internally
//! - User hooks return `anyhow::Error`, which the builder wraps into
//!   [`Error::Construction`] or [`Error::Configuration`] with field context
//! - Environment resolution never fails; only defining an invalid
//!   environment does

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for toolshed operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The value handed to the builder cannot be traversed.
    #[error("Invalid root: {message}")]
    InvalidRoot { message: String },

    /// No file matched any of the requested logical names.
    #[error("No config file found for '{}'", .names.join(" | "))]
    FileNotFound { names: Vec<String> },

    /// The file extension has no registered decoder.
    #[error("Unsupported config format for {path}")]
    UnsupportedFormat { path: PathBuf },

    /// File contents (or an annotation literal) are malformed for their format.
    #[error("Failed to decode {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// A placeholder could not be rendered.
    #[error("Template error in {path}: {message}")]
    Template { path: PathBuf, message: String },

    /// A required field is missing or an annotation is malformed.
    #[error("Field '{field}': {message}")]
    Tag { field: String, message: String },

    /// A constructor or registered factory failed or produced the wrong type.
    #[error("Cannot make '{field}' ({expected}): {message}")]
    Construction {
        field: String,
        expected: String,
        message: String,
    },

    /// An in-place configure hook failed.
    #[error("Cannot configure '{field}' ({type_name}) from [{}]: {source}", display_files(.files))]
    Configuration {
        field: String,
        type_name: String,
        files: Vec<PathBuf>,
        #[source]
        source: anyhow::Error,
    },

    /// An environment's primary tag is not matched by its own pattern.
    #[error("Environment tag '{tag}' must be matched by its pattern '{pattern}'")]
    EnvironmentInvalid { tag: String, pattern: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_files(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for toolshed operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_joins_names() {
        let err = Error::FileNotFound {
            names: vec!["cfg".into(), "db/cfg".into()],
        };
        assert_eq!(err.to_string(), "No config file found for 'cfg | db/cfg'");
    }

    #[test]
    fn unsupported_format_displays_path() {
        let err = Error::UnsupportedFormat {
            path: PathBuf::from("/conf/app.ini"),
        };
        assert!(err.to_string().contains("/conf/app.ini"));
    }

    #[test]
    fn tag_error_names_field() {
        let err = Error::Tag {
            field: "database.password".into(),
            message: "is required".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("database.password"));
        assert!(msg.contains("is required"));
    }

    #[test]
    fn construction_error_names_expected_type() {
        let err = Error::Construction {
            field: "cache".into(),
            expected: "app::Cache".into(),
            message: "factory returned app::Queue".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache"));
        assert!(msg.contains("app::Cache"));
        assert!(msg.contains("app::Queue"));
    }

    #[test]
    fn configuration_error_lists_files() {
        let err = Error::Configuration {
            field: "mailer".into(),
            type_name: "app::Mailer".into(),
            files: vec![
                PathBuf::from("conf/mailer.yaml"),
                PathBuf::from("conf/mailer.staging.yaml"),
            ],
            source: anyhow::anyhow!("smtp host missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("conf/mailer.yaml, conf/mailer.staging.yaml"));
        assert!(msg.contains("smtp host missing"));
    }

    #[test]
    fn environment_invalid_displays_tag_and_pattern() {
        let err = Error::EnvironmentInvalid {
            tag: "qa".into(),
            pattern: "^uat$".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("qa"));
        assert!(msg.contains("^uat$"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(Error::InvalidRoot {
                message: "nil pointer".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
