//! File sources for configuration files.
//!
//! Config files are listed and read through [`FileSource`], so the same
//! locating and loading logic works against a directory on disk
//! ([`LocalFiles`]) or a directory embedded in the binary at compile time
//! ([`EmbeddedFiles`]).

use include_dir::Dir;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lists and reads configuration files.
pub trait FileSource: Send + Sync + fmt::Debug {
    /// The directory logical file names are relative to.
    fn root(&self) -> &Path;

    /// Regular files directly inside `dir`, sorted by file name.
    ///
    /// Sub-directories are not descended into. A missing directory has no
    /// files.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// The contents of a file returned by [`FileSource::list_files`].
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Config files on the local file system.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    /// Files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for LocalFiles {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Config files embedded with [`include_dir::include_dir!`].
///
/// Paths are relative to the embedded directory.
///
/// # Example
///
/// ```ignore
/// use include_dir::{include_dir, Dir};
/// use toolshed::config::EmbeddedFiles;
///
/// static CONFIG: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/config");
/// let source = EmbeddedFiles::new(&CONFIG);
/// ```
#[derive(Clone)]
pub struct EmbeddedFiles {
    dir: &'static Dir<'static>,
    root: PathBuf,
}

impl EmbeddedFiles {
    /// Files in an embedded directory.
    pub fn new(dir: &'static Dir<'static>) -> Self {
        Self {
            dir,
            root: PathBuf::new(),
        }
    }

    fn subdir(&self, dir: &Path) -> Option<&'static Dir<'static>> {
        if dir.as_os_str().is_empty() || dir == Path::new(".") {
            Some(self.dir)
        } else {
            self.dir.get_dir(dir)
        }
    }
}

impl fmt::Debug for EmbeddedFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFiles")
            .field("entries", &self.dir.entries().len())
            .finish()
    }
}

impl FileSource for EmbeddedFiles {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let Some(subdir) = self.subdir(dir) else {
            return Ok(Vec::new());
        };
        let mut files: Vec<PathBuf> = subdir.files().map(|f| f.path().to_path_buf()).collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.dir
            .get_file(path)
            .map(|f| f.contents().to_vec())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not embedded", path.display()),
                )
            })
    }
}
