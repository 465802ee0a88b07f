//! Node and handle kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Kind carried on a [`crate::VirtualPath`].
///
/// Not part of path identity: two paths that differ only by kind are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum NodeKind {
    /// Regular file.
    #[default]
    File,
    /// Folder (directory, bucket, prefix).
    #[strum(serialize = "folder", serialize = "directory", serialize = "dir")]
    Folder,
}

impl NodeKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Folder => "folder",
        }
    }

    /// Returns true if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind reported by a file handle.
///
/// `Imaginary` means "nothing there (yet)": the handle's connection is
/// unknown, its backend is unreachable, or the backing file does not exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FileKind {
    #[default]
    Imaginary,
    File,
    #[strum(serialize = "folder", serialize = "directory", serialize = "dir")]
    Folder,
}

impl FileKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Imaginary => "imaginary",
            FileKind::File => "file",
            FileKind::Folder => "folder",
        }
    }

    /// Returns true if something exists at the handle.
    pub fn exists(&self) -> bool {
        !matches!(self, FileKind::Imaginary)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FileKind::File)
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FileKind::Folder)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A folder stays a folder; everything else names a file.
impl From<FileKind> for NodeKind {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Folder => NodeKind::Folder,
            FileKind::File | FileKind::Imaginary => NodeKind::File,
        }
    }
}

impl From<NodeKind> for FileKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::File => FileKind::File,
            NodeKind::Folder => FileKind::Folder,
        }
    }
}
