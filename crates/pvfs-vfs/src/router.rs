//! Backing manager that routes by URI scheme.
//!
//! Lets one [`VirtualFileSystem`](crate::VirtualFileSystem) front several
//! backends: `s3://` to one manager, `mem://` to another.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::config::FileSystemOptions;
use crate::ops::FileHandle;
use crate::provider::BackingFileSystemManager;
use crate::{VfsError, VfsResult};

/// Information about a registered scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeInfo {
    /// Lowercased scheme, e.g. `s3`.
    pub scheme: String,
}

/// Routes backing URIs to per-scheme managers.
///
/// Schemes match case-insensitively. A URI with no registered scheme fails
/// with [`VfsError::Unsupported`].
pub struct SchemeRouter {
    managers: RwLock<BTreeMap<String, Arc<dyn BackingFileSystemManager>>>,
}

impl fmt::Debug for SchemeRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeRouter")
            .field("schemes", &self.managers.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SchemeRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeRouter {
    pub fn new() -> Self {
        Self {
            managers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a manager for `scheme`, replacing any existing one.
    pub fn register(&self, scheme: &str, manager: impl BackingFileSystemManager + 'static) {
        self.register_arc(scheme, Arc::new(manager));
    }

    /// Register a manager (already wrapped in Arc) for `scheme`.
    pub fn register_arc(&self, scheme: &str, manager: Arc<dyn BackingFileSystemManager>) {
        self.managers.write().insert(scheme.to_ascii_lowercase(), manager);
    }

    /// Returns `true` if a manager was removed.
    pub fn unregister(&self, scheme: &str) -> bool {
        self.managers
            .write()
            .remove(&scheme.to_ascii_lowercase())
            .is_some()
    }

    pub fn schemes(&self) -> Vec<SchemeInfo> {
        self.managers
            .read()
            .keys()
            .map(|scheme| SchemeInfo {
                scheme: scheme.clone(),
            })
            .collect()
    }

    fn find_manager(&self, uri: &str) -> VfsResult<Arc<dyn BackingFileSystemManager>> {
        let (scheme, _) = uri
            .split_once("://")
            .ok_or_else(|| VfsError::unsupported(format!("not a backend uri: {uri}")))?;

        self.managers
            .read()
            .get(&scheme.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| VfsError::unsupported(format!("no backend for scheme '{scheme}'")))
    }
}

impl BackingFileSystemManager for SchemeRouter {
    fn resolve(&self, uri: &str, options: &FileSystemOptions) -> VfsResult<Arc<dyn FileHandle>> {
        let manager = self.find_manager(uri)?;
        trace!(%uri, "routing backing uri");
        manager.resolve(uri, options)
    }
}
