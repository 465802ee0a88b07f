//! Construction errors for virtual paths.

use thiserror::Error;

/// Argument error raised while building or parsing a [`crate::VirtualPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The URI does not carry the `pvfs://` scheme.
    #[error("not a pvfs uri: {0}")]
    UnsupportedScheme(String),

    /// A connection name was present but empty.
    #[error("empty connection name in: {0}")]
    EmptyConnectionName(String),

    /// A connection name contained a separator.
    #[error("connection name may not contain '/': {0}")]
    InvalidConnectionName(String),

    /// A path inside a connection did not start with a separator.
    #[error("path must start with '/': {0}")]
    RelativePath(String),

    /// A child segment named more than one level.
    #[error("child segment may not contain '/': {0}")]
    InvalidSegment(String),

    /// A child segment was empty.
    #[error("empty child segment under: {0}")]
    EmptySegment(String),
}
