//! Config file discovery by naming convention.
//!
//! A logical name such as `services/db` is looked up next to its parent
//! directory as `db.<ext>` and, for an active environment, as
//! `db.<tag>.<ext>`. The environment file always follows the generic one
//! so it overrides it when loaded.

use crate::config::format::Formats;
use crate::config::source::{FileSource, LocalFiles};
use crate::environment::Environment;
use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Finds config files for logical names.
#[derive(Debug, Clone)]
pub struct FileLocator {
    source: Arc<dyn FileSource>,
    formats: Formats,
    case_sensitive: bool,
}

impl FileLocator {
    pub fn new(source: Arc<dyn FileSource>) -> Self {
        Self {
            source,
            formats: Formats::default(),
            case_sensitive: false,
        }
    }

    /// A locator over a directory on disk.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalFiles::new(root)))
    }

    /// Match file names case-sensitively (extensions never are).
    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Only consider files with these extensions.
    pub fn with_formats(mut self, formats: Formats) -> Self {
        self.formats = formats;
        self
    }

    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.source
    }

    /// Locate the files for `names`, in order.
    ///
    /// For every name the generic file comes first, then the file for
    /// `environment` when one is given and exists.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` when no file was found for any of the names.
    ///
    /// # Example
    ///
    /// ```
    /// use tempfile::TempDir;
    /// use toolshed::config::FileLocator;
    /// use toolshed::environment::Environment;
    ///
    /// let temp = TempDir::new().unwrap();
    /// std::fs::write(temp.path().join("cfg.yaml"), "a: 1").unwrap();
    /// std::fs::write(temp.path().join("cfg.production.yaml"), "a: 2").unwrap();
    ///
    /// let files = FileLocator::local(temp.path())
    ///     .locate(&["cfg"], Some(&Environment::production()))
    ///     .unwrap();
    /// assert!(files[0].ends_with("cfg.yaml"));
    /// assert!(files[1].ends_with("cfg.production.yaml"));
    /// ```
    pub fn locate<S: AsRef<str>>(
        &self,
        names: &[S],
        environment: Option<&Environment>,
    ) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for name in names {
            let target = self.source.root().join(name.as_ref());
            let (dir, stem, ext) = self.split(&target);

            if let Some(file) = self.find(&dir, &stem, ext.as_deref())? {
                found.push(file);
            }
            if let Some(env) = environment {
                let env_stem = format!("{}.{}", stem, env.tag());
                if let Some(file) = self.find(&dir, &env_stem, ext.as_deref())? {
                    found.push(file);
                }
            }
        }

        if found.is_empty() {
            return Err(Error::FileNotFound {
                names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            });
        }

        tracing::debug!(
            "Located {} for {}",
            found
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            names
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" | ")
        );
        Ok(found)
    }

    /// Split into parent directory, stem and registered extension.
    fn split(&self, target: &Path) -> (PathBuf, String, Option<String>) {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.source.root().to_path_buf(),
        };
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && self.formats.supports(ext) => {
                (dir, stem.to_string(), Some(ext.to_string()))
            }
            _ => (dir, file_name, None),
        }
    }

    /// The last file in `dir` whose name is `stem` plus an extension.
    fn find(&self, dir: &Path, stem: &str, ext: Option<&str>) -> Result<Option<PathBuf>> {
        let matcher = self.matcher(stem, ext)?;
        let files = self.source.list_files(dir)?;

        Ok(files.into_iter().rev().find(|path| {
            path.file_name()
                .map(|n| matcher.is_match(&n.to_string_lossy()))
                .unwrap_or(false)
        }))
    }

    fn matcher(&self, stem: &str, ext: Option<&str>) -> Result<Regex> {
        let extensions = match ext {
            Some(ext) => regex::escape(ext),
            None => self
                .formats
                .extensions()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("|"),
        };
        let flags = if self.case_sensitive { "" } else { "(?i)" };
        let pattern = format!(
            r"^{}{}\.(?i:{})$",
            flags,
            regex::escape(stem),
            extensions
        );

        Regex::new(&pattern).map_err(|e| Error::Other(anyhow::anyhow!(e)))
    }
}
