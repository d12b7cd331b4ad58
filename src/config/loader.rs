//! Layered config loading.
//!
//! Files are applied in order onto the current value of the destination:
//!
//! 1. Each file is decoded with the codec for its extension and merged
//!    key by key (later files win).
//! 2. A file containing `${...}` placeholders is rendered against the
//!    merged tree and merged again, so values can reference keys loaded
//!    before them.
//! 3. Once every file is applied, field annotations are processed
//!    (`env`, `default`, `required`) and the tree is decoded into the
//!    destination type.
//!
//! Starting from the destination's current value means loading twice is
//! harmless: populated fields are only replaced by values present in the
//! files.

use crate::config::format::Formats;
use crate::config::interpolation::{is_template, render};
use crate::config::locator::FileLocator;
use crate::config::merger::merge_into;
use crate::config::shape::{apply_annotations, Annotated, Shape};
use crate::config::source::{FileSource, LocalFiles};
use crate::environment::Environment;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Looks up an environment variable by name.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads layered config files into typed destinations.
pub struct Loader {
    source: Arc<dyn FileSource>,
    formats: Formats,
    env_lookup: EnvLookup,
    shapes: Mutex<HashMap<TypeId, Arc<Shape>>>,
}

impl Loader {
    pub fn new(source: Arc<dyn FileSource>) -> Self {
        Self {
            source,
            formats: Formats::default(),
            env_lookup: Arc::new(|name| std::env::var(name).ok()),
            shapes: Mutex::new(HashMap::new()),
        }
    }

    /// A loader reading from the local file system, rooted at the current
    /// directory.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalFiles::new(".")))
    }

    pub fn with_formats(mut self, formats: Formats) -> Self {
        self.formats = formats;
        self
    }

    /// Replace the process environment lookup used by `env=` annotations.
    pub fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env_lookup = lookup;
        self
    }

    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.source
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    /// Load `files` in order into `dest`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for an extension without a codec
    /// - `Io` when a file cannot be read
    /// - `Decode` for malformed contents or a tree that does not fit `T`
    /// - `Template` when a placeholder cannot be rendered
    /// - `Tag` for a missing required field or a malformed annotation
    pub fn load<T, P>(&self, dest: &mut T, files: &[P]) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Annotated + 'static,
        P: AsRef<Path>,
    {
        let mut merged = serde_yaml::to_value(&*dest).map_err(|e| Error::Decode {
            source_name: type_name::<T>().to_string(),
            message: e.to_string(),
        })?;

        for file in files {
            self.apply_file(&mut merged, file.as_ref())?;
        }

        let shape = self.shape_of::<T>();
        shape.validate()?;
        let lookup = |name: &str| (self.env_lookup)(name);
        apply_annotations(&mut merged, &shape, "", &lookup)?;

        *dest = serde_yaml::from_value(merged).map_err(|e| Error::Decode {
            source_name: display_paths(files),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load `files` into an untyped value tree, without annotations.
    pub fn load_value<P: AsRef<Path>>(&self, files: &[P]) -> Result<Value> {
        let mut merged = Value::Mapping(Default::default());
        for file in files {
            self.apply_file(&mut merged, file.as_ref())?;
        }
        Ok(merged)
    }

    /// Locate the generic and `environment` files for `names`, then load
    /// them into `dest`.
    pub fn load_for<T, S>(
        &self,
        dest: &mut T,
        environment: Option<&Environment>,
        names: &[S],
    ) -> Result<Vec<PathBuf>>
    where
        T: Serialize + DeserializeOwned + Annotated + 'static,
        S: AsRef<str>,
    {
        let files = FileLocator::new(self.source.clone())
            .with_formats(self.formats.clone())
            .locate(names, environment)?;
        self.load(dest, &files)?;
        Ok(files)
    }

    fn apply_file(&self, merged: &mut Value, path: &Path) -> Result<()> {
        let codec = self
            .formats
            .for_path(path)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;

        let bytes = self.source.read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| Error::Decode {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;

        let decode = |text: &str| {
            codec.decode(text).map_err(|message| Error::Decode {
                source_name: path.display().to_string(),
                message,
            })
        };

        merge_into(merged, decode(&text)?);

        if is_template(&text) {
            let rendered = render(&text, merged).map_err(|message| Error::Template {
                path: path.to_path_buf(),
                message,
            })?;
            merge_into(merged, decode(&rendered)?);
        }

        tracing::debug!("Loaded {}", path.display());
        Ok(())
    }

    fn shape_of<T: Annotated + 'static>(&self) -> Arc<Shape> {
        let mut shapes = self
            .shapes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        shapes
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(T::shape()))
            .clone()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::local()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("source", &self.source)
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

/// Load local `files` in order into `dest`.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use tempfile::TempDir;
/// use toolshed::config::{self, Annotated, Field, Shape};
///
/// #[derive(Serialize, Deserialize, Default)]
/// struct App {
///     x: u32,
///     y: u32,
/// }
///
/// impl Annotated for App {
///     fn shape() -> Shape {
///         Shape::empty()
///     }
/// }
///
/// let temp = TempDir::new().unwrap();
/// let a = temp.path().join("a.yaml");
/// let b = temp.path().join("b.yaml");
/// std::fs::write(&a, "x: 1\ny: 2").unwrap();
/// std::fs::write(&b, "y: 3").unwrap();
///
/// let mut app = App::default();
/// config::load(&mut app, &[a, b]).unwrap();
/// assert_eq!((app.x, app.y), (1, 3));
/// ```
pub fn load<T, P>(dest: &mut T, files: &[P]) -> Result<()>
where
    T: Serialize + DeserializeOwned + Annotated + 'static,
    P: AsRef<Path>,
{
    Loader::local().load(dest, files)
}

/// Located files handed to constructors and configure hooks.
///
/// Carries the loader that located them, so hooks read through the same
/// file source and env lookup as the builder.
#[derive(Debug, Clone)]
pub struct ConfigFiles {
    paths: Vec<PathBuf>,
    loader: Arc<Loader>,
    environment: Environment,
}

impl ConfigFiles {
    pub fn new(paths: Vec<PathBuf>, loader: Arc<Loader>, environment: Environment) -> Self {
        Self {
            paths,
            loader,
            environment,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The environment the files were located for.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Load every file into `dest`.
    pub fn load<T>(&self, dest: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Annotated + 'static,
    {
        self.loader.load(dest, &self.paths)
    }

    /// Load every file into a value tree.
    pub fn load_value(&self) -> Result<Value> {
        self.loader.load_value(&self.paths)
    }
}

fn display_paths<P: AsRef<Path>>(files: &[P]) -> String {
    files
        .iter()
        .map(|f| f.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::shape::Field;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Server {
        host: String,
        port: u16,
        base_url: String,
        tags: Vec<String>,
    }

    impl Annotated for Server {
        fn shape() -> Shape {
            Shape::Struct(vec![
                Field::of::<String>("host").default_value("localhost"),
                Field::of::<u16>("port").env("SERVER_PORT").required(),
            ])
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn loader(dir: &TempDir) -> Loader {
        Loader::new(Arc::new(LocalFiles::new(dir.path()))).with_env_lookup(Arc::new(|_| None))
    }

    #[test]
    fn later_files_override_per_key() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "host: a.example\nport: 80\ntags: [x]");
        let b = write(&temp, "b.yaml", "port: 443");

        let mut server = Server::default();
        loader(&temp).load(&mut server, &[a, b]).unwrap();

        assert_eq!(server.host, "a.example");
        assert_eq!(server.port, 443);
        assert_eq!(server.tags, ["x"]);
    }

    #[test]
    fn mixed_formats() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.toml", "host = \"toml.example\"\nport = 1");
        let b = write(&temp, "b.json", r#"{"port": 2}"#);

        let mut server = Server::default();
        loader(&temp).load(&mut server, &[a, b]).unwrap();
        assert_eq!(server.host, "toml.example");
        assert_eq!(server.port, 2);
    }

    #[test]
    fn placeholders_reference_loaded_keys() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "host: api.example\nport: 8443");
        let b = write(&temp, "b.yaml", "base_url: \"https://${host}:${port}/v1\"");

        let mut server = Server::default();
        loader(&temp).load(&mut server, &[a, b]).unwrap();
        assert_eq!(server.base_url, "https://api.example:8443/v1");
    }

    #[test]
    fn placeholder_to_sibling_in_same_file() {
        let temp = TempDir::new().unwrap();
        let a = write(
            &temp,
            "a.yaml",
            "host: svc\nport: 1\nbase_url: \"http://${host}\"",
        );

        let mut server = Server::default();
        loader(&temp).load(&mut server, &[a]).unwrap();
        assert_eq!(server.base_url, "http://svc");
    }

    #[test]
    fn unresolved_placeholder_is_template_error() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "port: 1\nbase_url: \"${nowhere}\"");

        let err = loader(&temp)
            .load(&mut Server::default(), &[a])
            .unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.ini", "port=1");

        let err = loader(&temp)
            .load(&mut Server::default(), &[a])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn malformed_file_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.json", "{\"port\": ");

        let err = loader(&temp)
            .load(&mut Server::default(), &[a])
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref source_name, .. } if source_name.ends_with("a.json")));
    }

    #[test]
    fn required_field_missing_everywhere() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "host: a");

        let err = loader(&temp)
            .load(&mut Server::default(), &[a])
            .unwrap_err();
        assert!(matches!(err, Error::Tag { ref field, .. } if field == "port"));
    }

    #[test]
    fn required_field_from_env_only() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "host: a");

        let loader = loader(&temp).with_env_lookup(Arc::new(|name| {
            (name == "SERVER_PORT").then(|| "7000".to_string())
        }));
        let mut server = Server::default();
        loader.load(&mut server, &[a]).unwrap();
        assert_eq!(server.port, 7000);
    }

    #[test]
    fn loading_twice_keeps_values() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "port: 80");
        let loader = loader(&temp);

        let mut server = Server {
            base_url: "preset".into(),
            ..Server::default()
        };
        loader.load(&mut server, &[&a]).unwrap();
        let first = serde_yaml::to_string(&server).unwrap();
        loader.load(&mut server, &[&a]).unwrap();

        assert_eq!(serde_yaml::to_string(&server).unwrap(), first);
        assert_eq!(server.base_url, "preset");
        assert_eq!(server.host, "localhost");
    }

    #[test]
    fn load_for_locates_environment_files() {
        let temp = TempDir::new().unwrap();
        write(&temp, "server.yaml", "host: generic\nport: 1");
        write(&temp, "server.production.yaml", "port: 2");

        let mut server = Server::default();
        let files = loader(&temp)
            .load_for(&mut server, Some(&Environment::production()), &["server"])
            .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(server.host, "generic");
        assert_eq!(server.port, 2);
    }

    #[test]
    fn load_value_merges_untyped() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "x: 1\ny: 2");
        let b = write(&temp, "b.yaml", "y: 3");

        let value = loader(&temp).load_value(&[a, b]).unwrap();
        assert_eq!(value, serde_yaml::from_str::<Value>("x: 1\ny: 3").unwrap());
    }

    #[test]
    fn config_files_load_through_their_loader() {
        let temp = TempDir::new().unwrap();
        let a = write(&temp, "a.yaml", "port: 9");
        let files = ConfigFiles::new(vec![a], Arc::new(loader(&temp)), Environment::local());

        let mut server = Server::default();
        files.load(&mut server).unwrap();
        assert_eq!(server.port, 9);
        assert_eq!(files.environment().tag(), "local");
        assert_eq!(files.paths().len(), 1);
    }
}
