//! Environment definitions.
//!
//! An [`Environment`] is a deployment context identified by a primary tag
//! (the part of config file names that selects environment overrides, e.g.
//! `db.production.yaml`) and a pattern that recognises every candidate tag
//! belonging to it (`master`, `v1.2.0`, `release/3.4`, ...).

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;

/// How the active environment was determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    /// Set with `EnvironmentResolver::set_manual_tag`.
    Manual(String),
    /// Read from a system environment variable: (variable, value).
    SystemVariable(String, String),
    /// The current VCS branch name.
    VcsBranch(String),
    /// The running binary looks like a test binary.
    TestBinary(String),
    /// No source produced a tag.
    Fallback,
}

impl fmt::Display for Inference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual(tag) => write!(f, "'{}', set manually", tag),
            Self::SystemVariable(var, tag) => {
                write!(f, "'{}', from the `{}` environment variable", tag, var)
            }
            Self::VcsBranch(branch) => write!(f, "'{}', from the VCS branch name", branch),
            Self::TestBinary(program) => {
                write!(f, "testing, from the running file name ({})", program)
            }
            Self::Fallback => write!(f, "<empty>, default environment is `local`"),
        }
    }
}

/// A named deployment environment.
///
/// # Example
///
/// ```
/// use toolshed::environment::Environment;
///
/// let qa = Environment::new("qa", r"^(qa|uat)$").unwrap();
/// assert!(qa.matches("uat"));
/// assert!(!qa.matches("production"));
///
/// // The primary tag must satisfy its own pattern.
/// assert!(Environment::new("qa", "^uat$").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    tag: String,
    matcher: Regex,
    inferred_by: Option<Inference>,
}

impl Environment {
    /// Define an environment.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentInvalid` if the pattern does not compile or does
    /// not match `tag` itself.
    pub fn new(tag: impl Into<String>, pattern: &str) -> Result<Self> {
        let tag = tag.into();
        let matcher = Regex::new(pattern).map_err(|_| Error::EnvironmentInvalid {
            tag: tag.clone(),
            pattern: pattern.to_string(),
        })?;

        if !matcher.is_match(&tag) {
            return Err(Error::EnvironmentInvalid {
                tag,
                pattern: pattern.to_string(),
            });
        }

        Ok(Self {
            tag,
            matcher,
            inferred_by: None,
        })
    }

    fn builtin(tag: &str, pattern: &str) -> Self {
        Self::new(tag, pattern).expect("builtin environment pattern matches its tag")
    }

    /// The production environment: `production`, `master` and release
    /// version tags such as `v1.4.2`.
    pub fn production() -> Self {
        Self::builtin(
            "production",
            r"(production)|(master)|(^v(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))?(\.(\*|0|[1-9][0-9]*))?$)",
        )
    }

    /// The staging environment: `staging` and release/fix branches.
    pub fn staging() -> Self {
        Self::builtin("staging", r"(staging)|(release/)|(hotfix/)|(bugfix/)")
    }

    /// The testing environment.
    pub fn testing() -> Self {
        Self::builtin("testing", r"(testing)|(test)")
    }

    /// The development environment: `dev*` and feature branches.
    pub fn development() -> Self {
        Self::builtin("development", r"(development)|(develop)|(dev)|(feature/)")
    }

    /// The local environment, active when nothing else matches.
    pub fn local() -> Self {
        Self::builtin("local", r"local")
    }

    /// The five default environments in matching precedence order.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::production(),
            Self::staging(),
            Self::testing(),
            Self::development(),
            Self::local(),
        ]
    }

    /// The primary tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The matcher pattern source.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Whether `candidate` belongs to this environment.
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }

    /// How this environment was selected, when it came from a resolver.
    pub fn inferred_by(&self) -> Option<&Inference> {
        self.inferred_by.as_ref()
    }

    pub(crate) fn with_inference(mut self, inference: Inference) -> Self {
        self.inferred_by = Some(inference);
        self
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.matcher.as_str() == other.matcher.as_str()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inferred_by {
            Some(inference) => write!(f, "{} ({})", self.tag, inference),
            None => write!(f, "{}", self.tag),
        }
    }
}
