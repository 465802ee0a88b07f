//! The `pvfs://` virtual path value type.
//!
//! A [`VirtualPath`] names a location on a named connection without saying
//! anything about the backend behind it. It is immutable: traversal builds
//! new values via [`VirtualPath::create_child_name`] and
//! [`VirtualPath::parent`].
//!
//! Three forms exist:
//!
//! - scheme root: no connection, path `/` (`pvfs://`)
//! - connection root: connection, path `/` (`pvfs://conn/`)
//! - connection path: connection, path `/a/b` (`pvfs://conn/a/b`)
//!
//! The connection name is an opaque label rendered as-is. Path segments are
//! stored percent-encoded and decoded only for display and resolution.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::kind::NodeKind;
use crate::parser::VirtualPathParser;
use crate::path::{self, SEPARATOR, SEPARATOR_STR};

/// Scheme name of virtual paths.
pub const SCHEME: &str = "pvfs";

/// Scheme plus authority separator, the fixed prefix of every rendered path.
pub const SCHEME_PREFIX: &str = "pvfs://";

/// An immutable `pvfs://` name.
///
/// Equality and hashing cover the connection and path only; [`NodeKind`] is
/// carried along but two paths differing only by kind are the same name.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath {
    connection: Option<String>,
    path: String,
    kind: NodeKind,
}

impl VirtualPath {
    /// The root of the whole virtual namespace, `pvfs://`.
    pub fn scheme_root() -> Self {
        Self {
            connection: None,
            path: SEPARATOR_STR.to_string(),
            kind: NodeKind::Folder,
        }
    }

    /// The root of one connection's namespace, `pvfs://<name>/`.
    pub fn connection_root(name: impl Into<String>) -> Result<Self, PathError> {
        Self::new(name, SEPARATOR_STR, NodeKind::Folder)
    }

    /// Build a path inside a connection.
    ///
    /// `encoded_path` must start with `/`. Runs of separators collapse and
    /// trailing ones are dropped. Each segment is brought to one canonical
    /// percent-encoding, so `file(1).txt` and `file%281%29.txt` name the same
    /// path.
    pub fn new(
        connection: impl Into<String>,
        encoded_path: &str,
        kind: NodeKind,
    ) -> Result<Self, PathError> {
        let connection = connection.into();
        validate_connection_name(&connection)?;

        if !encoded_path.starts_with(SEPARATOR) {
            return Err(PathError::RelativePath(encoded_path.to_string()));
        }

        Ok(Self {
            connection: Some(connection),
            path: canonical_path(encoded_path),
            kind,
        })
    }

    /// Returns true for `pvfs://`.
    pub fn is_scheme_root(&self) -> bool {
        self.connection.is_none()
    }

    /// Returns true for `pvfs://<name>/`.
    pub fn is_connection_root(&self) -> bool {
        self.connection.is_some() && self.path == SEPARATOR_STR
    }

    /// The scheme, always [`SCHEME`].
    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// The percent-encoded path, starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Same name with a different kind.
    pub fn with_kind(&self, kind: NodeKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// The path with percent-escapes decoded.
    ///
    /// Escapes that do not decode to UTF-8 are left as written.
    pub fn decoded_path(&self) -> String {
        decode(&self.path)
    }

    /// Decoded last path segment; `""` for either root.
    pub fn base_name(&self) -> String {
        decode(path::base_name(&self.path))
    }

    /// Render as `pvfs://[<connection><path>]`.
    pub fn uri(&self) -> String {
        let mut uri = String::from(SCHEME_PREFIX);
        if let Some(connection) = &self.connection {
            uri.push_str(connection);
            uri.push_str(&self.path);
        }
        uri
    }

    /// URI for display. No credentials are embedded at this layer, so this is
    /// the same as [`VirtualPath::uri`].
    pub fn friendly_uri(&self) -> String {
        self.uri()
    }

    /// `pvfs://<connection>/`, or `None` for the scheme root.
    pub fn root_uri(&self) -> Option<String> {
        self.connection
            .as_ref()
            .map(|connection| format!("{SCHEME_PREFIX}{connection}{SEPARATOR}"))
    }

    /// Name a child of this path without touching any backend.
    ///
    /// Under the scheme root the segment is a connection name and is used
    /// verbatim; anywhere else it is percent-encoded and appended with
    /// exactly one separator.
    pub fn create_child_name(&self, segment: &str, kind: NodeKind) -> Result<Self, PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(self.uri()));
        }

        let Some(connection) = &self.connection else {
            validate_connection_name(segment)?;
            return Ok(Self {
                connection: Some(segment.to_string()),
                path: SEPARATOR_STR.to_string(),
                kind,
            });
        };

        let mut child = self.path.clone();
        path::append_path(&mut child, &urlencoding::encode(segment));

        Self::new(connection.clone(), &child, kind)
    }

    /// The enclosing folder.
    ///
    /// A connection root's parent is the scheme root; the scheme root has
    /// none.
    pub fn parent(&self) -> Option<Self> {
        let connection = self.connection.as_ref()?;

        if self.path == SEPARATOR_STR {
            return Some(Self::scheme_root());
        }

        Some(Self {
            connection: Some(connection.clone()),
            path: path::parent_path(&self.path).to_string(),
            kind: NodeKind::Folder,
        })
    }
}

fn validate_connection_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::EmptyConnectionName(name.to_string()));
    }
    if name.contains(SEPARATOR) {
        return Err(PathError::InvalidConnectionName(name.to_string()));
    }
    Ok(())
}

/// Collapse separators and re-encode every segment in canonical form.
///
/// Segments whose escapes do not decode to UTF-8 are kept as written.
fn canonical_path(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    for segment in encoded.split(SEPARATOR).filter(|s| !s.is_empty()) {
        out.push(SEPARATOR);
        match urlencoding::decode(segment) {
            Ok(decoded) => out.push_str(&urlencoding::encode(&decoded)),
            Err(_) => out.push_str(segment),
        }
    }
    if out.is_empty() {
        out.push_str(SEPARATOR_STR);
    }
    out
}

fn decode(encoded: &str) -> String {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| encoded.to_string())
}

impl PartialEq for VirtualPath {
    fn eq(&self, other: &Self) -> bool {
        self.connection == other.connection && self.path == other.path
    }
}

impl Eq for VirtualPath {}

impl Hash for VirtualPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.connection.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl FromStr for VirtualPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VirtualPathParser.parse(s)
    }
}

impl TryFrom<String> for VirtualPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VirtualPath> for String {
    fn from(path: VirtualPath) -> String {
        path.uri()
    }
}
