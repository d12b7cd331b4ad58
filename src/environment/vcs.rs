//! Version-control data sources.
//!
//! The resolver only consumes the branch name. Commit, tag and build
//! count are collected for diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A source of version-control information.
pub trait VersionControl: Send + Sync {
    /// The current branch name.
    fn branch_name(&self) -> anyhow::Result<String>;

    /// Everything known about the working copy, for diagnostics.
    fn info(&self) -> VcsInfo {
        VcsInfo {
            branch: self.branch_name().ok(),
            ..VcsInfo::default()
        }
    }
}

/// A snapshot of version-control details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsInfo {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub tag: Option<String>,
    pub build: Option<String>,
}

impl fmt::Display for VcsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        writeln!(f, "Branch: {}", show(&self.branch))?;
        writeln!(f, "Commit: {}", show(&self.commit))?;
        writeln!(f, "Tag:    {}", show(&self.tag))?;
        write!(f, "Build:  {}", show(&self.build))
    }
}

/// A git working copy, queried once when opened.
///
/// Git is invoked as a subprocess. A failing command (git missing, not a
/// repository, no commits yet) is captured and reported by
/// [`VersionControl::branch_name`], never raised from [`GitRepository::open`].
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
    info: VcsInfo,
    error: Option<String>,
}

impl GitRepository {
    /// Query the repository at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut error = None;
        let mut query = |args: &[&str]| match git(&path, args) {
            Ok(out) => Some(out),
            Err(e) => {
                error.get_or_insert(e);
                None
            }
        };

        let info = VcsInfo {
            branch: query(&["rev-parse", "--abbrev-ref", "HEAD"]),
            commit: query(&["rev-parse", "--short", "HEAD"]),
            build: query(&["rev-list", "--all", "--count"]),
            tag: query(&["describe", "--abbrev=0", "--tags", "--always"]),
        };

        if let Some(e) = &error {
            tracing::debug!("git query in {} failed: {}", path.display(), e);
        }

        Self { path, info, error }
    }

    /// The working copy path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The first error git reported, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl VersionControl for GitRepository {
    fn branch_name(&self) -> anyhow::Result<String> {
        if let Some(e) = &self.error {
            anyhow::bail!("{}", e);
        }
        self.info
            .branch
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no branch name"))
    }

    fn info(&self) -> VcsInfo {
        self.info.clone()
    }
}

/// A fixed branch name, for embedding build metadata or testing.
#[derive(Debug, Clone)]
pub struct StaticBranch(pub String);

impl VersionControl for StaticBranch {
    fn branch_name(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| e.to_string())?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim_end();
        let message = message.strip_prefix("fatal: ").unwrap_or(message);
        let message = message.strip_suffix(": .git").unwrap_or(message);
        return Err(message.to_string());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}
