//! Collaborators the virtual filesystem resolves through.
//!
//! The connection registry knows what a connection name means; the backing
//! filesystem manager knows how to open a backend URI. Both are injected into
//! [`crate::VirtualFileSystem`] at construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pvfs_types::path;
use serde::{Deserialize, Serialize};

use crate::config::FileSystemOptions;
use crate::ops::FileHandle;
use crate::VfsResult;

/// A named connection definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Connection name, the authority part of `pvfs://<name>/...`.
    pub name: String,
    /// Backend scheme (`s3`, `hdfs`, `file`, ...).
    pub scheme: String,
    /// Fixed root all paths on this connection live under.
    #[serde(default)]
    pub root_path: Option<String>,
    /// Backend domain (host, account, namespace).
    #[serde(default)]
    pub domain: Option<String>,
    /// Whether the backend can restrict a connection to a root path at all.
    #[serde(default = "default_true")]
    pub supports_root_path: bool,
}

fn default_true() -> bool {
    true
}

impl ConnectionDescriptor {
    pub fn new(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scheme: scheme.into(),
            root_path: None,
            domain: None,
            supports_root_path: true,
        }
    }

    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = Some(root_path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_root_path_support(mut self, supported: bool) -> Self {
        self.supports_root_path = supported;
        self
    }

    /// True when a root path is configured and not just whitespace.
    pub fn has_root_path(&self) -> bool {
        !is_blank(self.root_path.as_deref())
    }

    /// Backend URI for a decoded connection path:
    /// `<scheme>://[<domain>/][<root_path>/]<path>`.
    pub fn backend_uri(&self, decoded_path: &str) -> String {
        let mut uri = format!("{}://", self.scheme);
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.trim().is_empty()) {
            path::append_path(&mut uri, domain.trim());
        }
        if self.has_root_path() {
            if let Some(root) = self.root_path.as_deref() {
                path::append_path(&mut uri, root.trim());
            }
        }
        path::append_path(&mut uri, decoded_path);
        uri
    }
}

pub(crate) fn is_blank(s: Option<&str>) -> bool {
    s.is_none_or(|s| s.trim().is_empty())
}

/// Looks up connection definitions by name.
pub trait ConnectionRegistry: Send + Sync {
    /// The descriptor for `name`, or `None` if no such connection exists.
    fn lookup(&self, name: &str) -> Option<ConnectionDescriptor>;

    /// Backend URI for a decoded path on this connection.
    fn combine(&self, descriptor: &ConnectionDescriptor, decoded_path: &str) -> VfsResult<String> {
        Ok(descriptor.backend_uri(decoded_path))
    }

    /// Names of all known connections.
    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Opens concrete handles for backend URIs.
pub trait BackingFileSystemManager: Send + Sync {
    /// A handle for `uri`. The handle may point at nothing yet; failures here
    /// mean the backend itself could not be reached or understood.
    fn resolve(&self, uri: &str, options: &FileSystemOptions) -> VfsResult<Arc<dyn FileHandle>>;
}

/// In-process registry of connection definitions.
#[derive(Debug, Default)]
pub struct StaticConnectionRegistry {
    connections: RwLock<BTreeMap<String, ConnectionDescriptor>>,
}

impl StaticConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with `connections`; later duplicates win.
    pub fn with_connections(connections: impl IntoIterator<Item = ConnectionDescriptor>) -> Self {
        let registry = Self::new();
        for descriptor in connections {
            registry.register(descriptor);
        }
        registry
    }

    /// Add or replace a connection. Returns the replaced definition.
    pub fn register(&self, descriptor: ConnectionDescriptor) -> Option<ConnectionDescriptor> {
        self.connections
            .write()
            .insert(descriptor.name.clone(), descriptor)
    }

    /// Remove a connection. Returns `true` if one was removed.
    pub fn unregister(&self, name: &str) -> bool {
        self.connections.write().remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl ConnectionRegistry for StaticConnectionRegistry {
    fn lookup(&self, name: &str) -> Option<ConnectionDescriptor> {
        self.connections.read().get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.connections.read().keys().cloned().collect()
    }
}
