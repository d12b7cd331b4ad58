//! Config file formats.
//!
//! Every format decodes into a [`serde_yaml::Value`], the common tree used
//! for layering, placeholder rendering and annotation processing. YAML,
//! TOML and JSON are registered by default; more can be added per
//! extension.

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Decodes file text into a value tree.
pub trait Codec: Send + Sync {
    fn decode(&self, text: &str) -> Result<Value, String>;
}

/// YAML documents (`.yaml`, `.yml`).
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn decode(&self, text: &str) -> Result<Value, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }
}

/// TOML documents (`.toml`).
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn decode(&self, text: &str) -> Result<Value, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// JSON documents (`.json`).
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, text: &str) -> Result<Value, String> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

/// Codecs keyed by lowercase file extension.
#[derive(Clone)]
pub struct Formats {
    codecs: BTreeMap<String, Arc<dyn Codec>>,
}

impl Formats {
    /// No formats at all.
    pub fn empty() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Register `codec` for files ending in `.<extension>`.
    pub fn with(mut self, extension: &str, codec: impl Codec + 'static) -> Self {
        self.codecs.insert(
            extension.trim_start_matches('.').to_lowercase(),
            Arc::new(codec),
        );
        self
    }

    /// The codec for a path's extension, ignoring case.
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn Codec>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.codecs.get(&ext).cloned()
    }

    /// Whether `extension` (without the dot) has a codec.
    pub fn supports(&self, extension: &str) -> bool {
        self.codecs.contains_key(&extension.to_lowercase())
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}

impl Default for Formats {
    fn default() -> Self {
        Self::empty()
            .with("yaml", YamlCodec)
            .with("yml", YamlCodec)
            .with("toml", TomlCodec)
            .with("json", JsonCodec)
    }
}

impl fmt::Debug for Formats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.keys()).finish()
    }
}
