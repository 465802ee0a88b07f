//! Filesystem options and TOML configuration.
//!
//! ```toml
//! [options]
//! read_only = "false"
//!
//! [[connection]]
//! name = "My Connection"
//! scheme = "s3"
//! root_path = "bucket/base"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::provider::{ConnectionDescriptor, StaticConnectionRegistry};
use crate::VfsResult;

/// Opaque options handed to the backing filesystem manager on every
/// resolution. This layer never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSystemOptions(BTreeMap<String, String>);

impl FileSystemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when `key` is set to `true`/`yes`/`1` (case-insensitive).
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Top-level pvfs configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PvfsConfig {
    /// Options passed to the backing manager.
    #[serde(default)]
    pub options: FileSystemOptions,
    /// Connection definitions, one `[[connection]]` table each.
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionDescriptor>,
}

impl PvfsConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> VfsResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Build a registry holding the configured connections.
    ///
    /// A later definition with the same name replaces an earlier one.
    pub fn registry(&self) -> StaticConnectionRegistry {
        StaticConnectionRegistry::with_connections(self.connections.iter().cloned())
    }
}
