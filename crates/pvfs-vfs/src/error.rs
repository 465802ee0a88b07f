//! VFS error types.

use std::io;

use pvfs_types::PathError;
use thiserror::Error;

/// VFS error type.
///
/// Backing handles report failures with this same type, so the delegating
/// handle can hand them back to callers untouched.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Nothing to operate on: unknown connection, unreachable backend, or a
    /// missing file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// Expected a folder.
    #[error("not a folder: {0}")]
    NotAFolder(String),

    /// Expected a file.
    #[error("is a folder: {0}")]
    IsAFolder(String),

    /// Folder not empty.
    #[error("folder not empty: {0}")]
    FolderNotEmpty(String),

    /// Operation not valid in the handle's current state.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid virtual path.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a NotAFolder error.
    pub fn not_a_folder(path: impl Into<String>) -> Self {
        Self::NotAFolder(path.into())
    }

    /// Create an IsAFolder error.
    pub fn is_a_folder(path: impl Into<String>) -> Self {
        Self::IsAFolder(path.into())
    }

    /// Create a FolderNotEmpty error.
    pub fn folder_not_empty(path: impl Into<String>) -> Self {
        Self::FolderNotEmpty(path.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns true for the recoverable "nothing there" case.
    pub fn is_not_found(&self) -> bool {
        match self {
            VfsError::NotFound(_) => true,
            VfsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::PermissionDenied, "filesystem is read-only")
            }
            VfsError::NotAFolder(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsAFolder(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::FolderNotEmpty(msg) => {
                io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg)
            }
            VfsError::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            VfsError::InvalidPath(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
            VfsError::Config(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            VfsError::Io(e) => e,
            VfsError::Other(msg) => io::Error::other(msg),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
