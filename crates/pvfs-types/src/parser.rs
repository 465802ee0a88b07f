//! Parsing raw `pvfs://` URI strings.

use crate::error::PathError;
use crate::kind::NodeKind;
use crate::path::{SEPARATOR, SEPARATOR_STR};
use crate::virtual_path::{SCHEME_PREFIX, VirtualPath};

/// Turns raw URI strings into [`VirtualPath`] values.
///
/// Stateless; `VirtualPathParser.parse(..)` and `str::parse::<VirtualPath>()`
/// are equivalent.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualPathParser;

impl VirtualPathParser {
    /// Parse `pvfs://[<connection>[/<path>]]`.
    ///
    /// The connection name runs up to the first `/` after the scheme and is
    /// kept verbatim (spaces included, no percent-decoding). The path is
    /// canonicalized by [`VirtualPath::new`]. A trailing separator marks the
    /// path as a folder.
    pub fn parse(&self, uri: &str) -> Result<VirtualPath, PathError> {
        let rest = strip_scheme(uri).ok_or_else(|| PathError::UnsupportedScheme(uri.to_string()))?;

        if rest.is_empty() {
            return Ok(VirtualPath::scheme_root());
        }

        let (connection, raw_path) = match rest.find(SEPARATOR) {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, SEPARATOR_STR),
        };

        if connection.is_empty() {
            return Err(PathError::EmptyConnectionName(uri.to_string()));
        }

        let kind = if raw_path.ends_with(SEPARATOR) {
            NodeKind::Folder
        } else {
            NodeKind::File
        };

        VirtualPath::new(connection, raw_path, kind)
    }
}

/// Check whether a string carries the `pvfs://` scheme.
pub fn is_pvfs_uri(s: &str) -> bool {
    strip_scheme(s).is_some()
}

/// Remainder after the scheme prefix, matched ASCII case-insensitively.
fn strip_scheme(uri: &str) -> Option<&str> {
    let prefix = uri.get(..SCHEME_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(SCHEME_PREFIX) {
        Some(&uri[SCHEME_PREFIX.len()..])
    } else {
        None
    }
}
