//! Value types shared by every file handle.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Content metadata of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Size in bytes (0 for folders).
    pub size: u64,
    /// Last modification time, when the backend tracks one.
    pub last_modified: Option<SystemTime>,
    /// Backend-specific attributes (content type, storage class, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl FileContent {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            last_modified: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the modification time.
    pub fn with_last_modified(mut self, mtime: SystemTime) -> Self {
        self.last_modified = Some(mtime);
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Something a backend can do with its files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
    Append,
    RandomAccessRead,
    RandomAccessWrite,
    ListChildren,
    CreateFolder,
    Delete,
    Rename,
    LastModified,
    Attributes,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Append => "append",
            Capability::RandomAccessRead => "random_access_read",
            Capability::RandomAccessWrite => "random_access_write",
            Capability::ListChildren => "list_children",
            Capability::CreateFolder => "create_folder",
            Capability::Delete => "delete",
            Capability::Rename => "rename",
            Capability::LastModified => "last_modified",
            Capability::Attributes => "attributes",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mode for random-access content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    Read,
    /// Read and write; creates the file if missing.
    ReadWrite,
}

impl AccessMode {
    pub fn is_writable(&self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }
}

/// How much of a tree `copy_from` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopySelector {
    /// The source itself (a folder is created empty).
    SelfOnly,
    /// The source and its direct children.
    SelfAndChildren,
    /// The whole tree under the source.
    #[default]
    All,
}

impl CopySelector {
    /// Selector to apply one level further down.
    pub fn descend(&self) -> Option<CopySelector> {
        match self {
            CopySelector::SelfOnly => None,
            CopySelector::SelfAndChildren => Some(CopySelector::SelfOnly),
            CopySelector::All => Some(CopySelector::All),
        }
    }
}
