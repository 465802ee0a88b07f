//! Delegating file handle for virtual paths.
//!
//! A [`VirtualFileHandle`] starts out unresolved and binds to a backing
//! handle the first time an operation needs one:
//!
//! ```text
//!  Unresolved ──(resolution succeeds)──► Resolved(backing)
//!      │                                     │
//!      │ kind() = Imaginary                  │ everything forwarded
//!      │ exists() = false                    │ children wrapped as virtual
//!      │ content ops → NotFound              │
//! ```
//!
//! There is no way back. If a file's identity changes (say, after a move) the
//! caller makes a new handle.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::RwLock;
use pvfs_types::path::SEPARATOR;
use pvfs_types::{FileKind, NodeKind, PathError, VirtualPath};
use tracing::{debug, trace};

use crate::filesystem::VirtualFileSystem;
use crate::ops::{FileHandle, RandomAccessContent};
use crate::types::{AccessMode, Capability, CopySelector, FileContent};
use crate::{VfsError, VfsResult};

/// Backend scheme the downstream execution engine cannot handle as-is.
const S3_SCHEME: &str = "s3";

/// What it must be called instead.
const S3A_SCHEME: &str = "s3a";

enum HandleState {
    Unresolved,
    Resolved(Arc<dyn FileHandle>),
}

/// File handle for a `pvfs://` path.
pub struct VirtualFileHandle {
    path: VirtualPath,
    fs: Arc<VirtualFileSystem>,
    state: RwLock<HandleState>,
}

impl fmt::Debug for VirtualFileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileHandle")
            .field("uri", &self.path.uri())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl VirtualFileHandle {
    pub(crate) fn unresolved(path: VirtualPath, fs: Arc<VirtualFileSystem>) -> Self {
        Self {
            path,
            fs,
            state: RwLock::new(HandleState::Unresolved),
        }
    }

    pub(crate) fn resolved(
        path: VirtualPath,
        fs: Arc<VirtualFileSystem>,
        backing: Arc<dyn FileHandle>,
    ) -> Self {
        Self {
            path,
            fs,
            state: RwLock::new(HandleState::Resolved(backing)),
        }
    }

    pub fn virtual_path(&self) -> &VirtualPath {
        &self.path
    }

    /// The filesystem that created this handle.
    pub fn file_system(&self) -> &Arc<VirtualFileSystem> {
        &self.fs
    }

    /// Returns true once a backing handle is bound.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.read(), HandleState::Resolved(_))
    }

    /// The bound backing handle, without attempting resolution.
    pub fn backing(&self) -> Option<Arc<dyn FileHandle>> {
        match &*self.state.read() {
            HandleState::Resolved(backing) => Some(Arc::clone(backing)),
            HandleState::Unresolved => None,
        }
    }

    // ========================================================================
    // Identity (never delegated)
    // ========================================================================

    /// The handle's own `pvfs://` URI.
    pub fn original_uri(&self) -> String {
        self.path.uri()
    }

    /// The `pvfs://` URI, whatever backend the handle resolved to.
    pub fn public_uri(&self) -> String {
        self.path.friendly_uri()
    }

    /// The backing URI in a form the downstream execution engine accepts:
    /// an `s3` scheme becomes `s3a`, anything else passes through.
    ///
    /// Only meaningful once resolved; an unresolved handle is a caller bug and
    /// yields [`VfsError::Unsupported`].
    pub fn ael_safe_uri(&self) -> VfsResult<String> {
        match self.backing() {
            Some(backing) => Ok(rewrite_s3_scheme(&backing.uri())),
            None => Err(VfsError::unsupported(format!(
                "ael-safe uri requires a resolved handle: {}",
                self.path.uri()
            ))),
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// The enclosing folder as an unresolved handle. No I/O.
    pub fn parent(&self) -> Option<VirtualFileHandle> {
        self.path.parent().map(|path| self.fs.create_handle(path))
    }

    /// An existing direct child, wrapped as a resolved virtual handle.
    ///
    /// `name` is a single segment; names containing `/` are rejected.
    pub fn child(&self, name: &str) -> VfsResult<Option<VirtualFileHandle>> {
        if name.is_empty() {
            return Err(PathError::EmptySegment(self.path.uri()).into());
        }
        if name.contains(SEPARATOR) {
            return Err(PathError::InvalidSegment(name.to_string()).into());
        }

        let backing = self.require_backing()?;
        match backing.child(name)? {
            Some(child) => Ok(Some(self.fs.create_child(self, child)?)),
            None => Ok(None),
        }
    }

    /// All children, each wrapped as a resolved virtual handle.
    pub fn children(&self) -> VfsResult<Vec<VirtualFileHandle>> {
        let backing = self.require_backing()?;
        backing
            .children()?
            .into_iter()
            .map(|child| self.fs.create_child(self, child))
            .collect()
    }

    /// A handle for a child name whether or not it exists. No I/O.
    pub fn resolve_child(&self, name: &str) -> VfsResult<VirtualFileHandle> {
        let path = self.path.create_child_name(name, NodeKind::File)?;
        Ok(self.fs.create_handle(path))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Bind to a backing handle if not yet bound.
    ///
    /// `Ok(None)` when the path has nothing to resolve against.
    fn try_resolve(&self) -> VfsResult<Option<Arc<dyn FileHandle>>> {
        if let Some(backing) = self.backing() {
            return Ok(Some(backing));
        }

        let Some(resolved) = self.fs.resolve(&self.path)? else {
            return Ok(None);
        };

        let mut state = self.state.write();
        match &*state {
            HandleState::Resolved(existing) => Ok(Some(Arc::clone(existing))),
            HandleState::Unresolved => {
                debug!(uri = %self.path, backing = %resolved.uri(), "handle resolved");
                *state = HandleState::Resolved(Arc::clone(&resolved));
                Ok(Some(resolved))
            }
        }
    }

    /// The backing handle, or NotFound if resolution misses or fails.
    fn require_backing(&self) -> VfsResult<Arc<dyn FileHandle>> {
        match self.try_resolve() {
            Ok(Some(backing)) => Ok(backing),
            Ok(None) => Err(VfsError::not_found(self.path.uri())),
            Err(e) => Err(VfsError::not_found(format!("{}: {e}", self.path.uri()))),
        }
    }

    /// The backing handle if one can be had; resolution failures are logged
    /// and read as "nothing there".
    fn backing_if_any(&self) -> Option<Arc<dyn FileHandle>> {
        match self.try_resolve() {
            Ok(backing) => backing,
            Err(e) => {
                trace!(uri = %self.path, error = %e, "treating unresolvable handle as imaginary");
                None
            }
        }
    }
}

fn rewrite_s3_scheme(uri: &str) -> String {
    match uri.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(S3_SCHEME) => {
            format!("{S3A_SCHEME}://{rest}")
        }
        _ => uri.to_string(),
    }
}

impl FileHandle for VirtualFileHandle {
    fn uri(&self) -> String {
        self.original_uri()
    }

    fn base_name(&self) -> String {
        self.path.base_name()
    }

    fn listed_kind(&self) -> Option<FileKind> {
        self.backing().and_then(|backing| backing.listed_kind())
    }

    fn kind(&self) -> VfsResult<FileKind> {
        match self.backing_if_any() {
            Some(backing) => backing.kind(),
            None => Ok(FileKind::Imaginary),
        }
    }

    fn exists(&self) -> VfsResult<bool> {
        match self.backing_if_any() {
            Some(backing) => backing.exists(),
            None => Ok(false),
        }
    }

    fn content(&self) -> VfsResult<FileContent> {
        self.require_backing()?.content()
    }

    fn capabilities(&self) -> VfsResult<BTreeSet<Capability>> {
        self.require_backing()?.capabilities()
    }

    fn input_stream(&self) -> VfsResult<Box<dyn Read + Send>> {
        self.require_backing()?.input_stream()
    }

    fn output_stream(&self, append: bool) -> VfsResult<Box<dyn Write + Send>> {
        self.require_backing()?.output_stream(append)
    }

    fn random_access(&self, mode: AccessMode) -> VfsResult<Box<dyn RandomAccessContent>> {
        self.require_backing()?.random_access(mode)
    }

    fn child(&self, name: &str) -> VfsResult<Option<Arc<dyn FileHandle>>> {
        Ok(VirtualFileHandle::child(self, name)?.map(|h| Arc::new(h) as Arc<dyn FileHandle>))
    }

    fn children(&self) -> VfsResult<Vec<Arc<dyn FileHandle>>> {
        Ok(VirtualFileHandle::children(self)?
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn FileHandle>)
            .collect())
    }

    fn resolve_child(&self, name: &str) -> VfsResult<Arc<dyn FileHandle>> {
        Ok(Arc::new(VirtualFileHandle::resolve_child(self, name)?))
    }

    fn create_file(&self) -> VfsResult<()> {
        self.require_backing()?.create_file()
    }

    fn create_folder(&self) -> VfsResult<()> {
        self.require_backing()?.create_folder()
    }

    fn delete(&self) -> VfsResult<bool> {
        self.require_backing()?.delete()
    }

    fn delete_all(&self) -> VfsResult<u64> {
        self.require_backing()?.delete_all()
    }

    fn copy_from(&self, source: &dyn FileHandle, selector: CopySelector) -> VfsResult<()> {
        self.require_backing()?.copy_from(source, selector)
    }

    fn move_to(&self, dest: &dyn FileHandle) -> VfsResult<()> {
        self.require_backing()?.move_to(dest)
    }

    fn refresh(&self) -> VfsResult<()> {
        self.require_backing()?.refresh()
    }

    fn close(&self) -> VfsResult<()> {
        match self.backing() {
            Some(backing) => backing.close(),
            None => Ok(()),
        }
    }
}
