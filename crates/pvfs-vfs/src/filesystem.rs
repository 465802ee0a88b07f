//! The virtual filesystem: virtual paths in, backing handles out.
//!
//! Resolution is a two-step lookup:
//!
//! ```text
//! pvfs://My Connection/dir/a%20b
//!         │               │
//!         ▼               ▼ decoded: /dir/a b
//!   registry.lookup ──► registry.combine ──► s3://bucket/dir/a b
//!                                               │
//!                                               ▼
//!                                      manager.resolve(uri, options)
//! ```
//!
//! Nothing is cached: every resolution asks the registry and manager again.

use std::fmt;
use std::sync::Arc;

use pvfs_types::{NodeKind, VirtualPath, VirtualPathParser};
use tracing::{debug, warn};

use crate::config::{FileSystemOptions, PvfsConfig};
use crate::handle::VirtualFileHandle;
use crate::ops::FileHandle;
use crate::provider::{BackingFileSystemManager, ConnectionRegistry};
use crate::VfsResult;

/// Resolves `pvfs://` paths against named connections.
///
/// Holds only read-only state, so one instance can be shared across threads
/// behind an `Arc`. Handles keep the `Arc` alive.
pub struct VirtualFileSystem {
    root: VirtualPath,
    options: FileSystemOptions,
    registry: Arc<dyn ConnectionRegistry>,
    manager: Arc<dyn BackingFileSystemManager>,
}

impl fmt::Debug for VirtualFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileSystem")
            .field("root", &self.root.uri())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl VirtualFileSystem {
    /// Create a filesystem over the given registry and backing manager.
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        manager: Arc<dyn BackingFileSystemManager>,
        options: FileSystemOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            root: VirtualPath::scheme_root(),
            options,
            registry,
            manager,
        })
    }

    /// Create a filesystem from parsed configuration.
    pub fn from_config(
        config: &PvfsConfig,
        manager: Arc<dyn BackingFileSystemManager>,
    ) -> Arc<Self> {
        Self::new(Arc::new(config.registry()), manager, config.options.clone())
    }

    /// The scheme root, `pvfs://`.
    pub fn root(&self) -> &VirtualPath {
        &self.root
    }

    pub fn options(&self) -> &FileSystemOptions {
        &self.options
    }

    /// A new unresolved handle for `path`. No I/O.
    pub fn create_handle(self: &Arc<Self>, path: VirtualPath) -> VirtualFileHandle {
        VirtualFileHandle::unresolved(path, Arc::clone(self))
    }

    /// Parse `uri` and create an unresolved handle for it.
    pub fn open(self: &Arc<Self>, uri: &str) -> VfsResult<VirtualFileHandle> {
        let path = VirtualPathParser.parse(uri)?;
        Ok(self.create_handle(path))
    }

    /// One unresolved handle per connection root the registry knows about.
    pub fn connections(self: &Arc<Self>) -> Vec<VirtualFileHandle> {
        self.registry
            .names()
            .into_iter()
            .filter_map(|name| {
                self.root
                    .create_child_name(&name, NodeKind::Folder)
                    .map_err(|e| warn!(connection = %name, error = %e, "skipping connection"))
                    .ok()
            })
            .map(|path| self.create_handle(path))
            .collect()
    }

    /// Find the backing handle for `path`.
    ///
    /// `Ok(None)` means there is nothing to resolve against: the path is the
    /// scheme root or names an unknown connection. `Err` carries a failure
    /// from the registry or backing manager.
    pub fn resolve(&self, path: &VirtualPath) -> VfsResult<Option<Arc<dyn FileHandle>>> {
        let Some(name) = path.connection_name() else {
            debug!("scheme root has no backing handle");
            return Ok(None);
        };

        let Some(descriptor) = self.registry.lookup(name) else {
            debug!(connection = %name, "connection not found");
            return Ok(None);
        };

        let uri = self.registry.combine(&descriptor, &path.decoded_path())?;
        match self.manager.resolve(&uri, &self.options) {
            Ok(handle) => {
                debug!(connection = %name, %uri, "resolved virtual path");
                Ok(Some(handle))
            }
            Err(e) => {
                warn!(connection = %name, %uri, error = %e, "backing resolution failed");
                Err(e)
            }
        }
    }

    /// Wrap a backing child (from a listing) as a resolved virtual handle
    /// under `parent`, skipping a second resolution round-trip.
    ///
    /// The path is named from the child's base name. Its kind comes from the
    /// listing when the backend recorded one and is `File` otherwise; the
    /// backend is not queried.
    pub fn create_child(
        self: &Arc<Self>,
        parent: &VirtualFileHandle,
        backing_child: Arc<dyn FileHandle>,
    ) -> VfsResult<VirtualFileHandle> {
        let kind = backing_child
            .listed_kind()
            .map(NodeKind::from)
            .unwrap_or_default();
        let path = parent
            .virtual_path()
            .create_child_name(&backing_child.base_name(), kind)?;
        Ok(VirtualFileHandle::resolved(path, Arc::clone(self), backing_child))
    }
}
