//! File handle capability trait.
//!
//! Every handle in the system speaks this one interface: backing handles
//! handed out by a [`crate::BackingFileSystemManager`] and the delegating
//! [`crate::VirtualFileHandle`] alike. Calls are synchronous and may block
//! on the backing store.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Read, Seek, Write};
use std::sync::Arc;

use pvfs_types::FileKind;

use super::types::{AccessMode, Capability, CopySelector, FileContent};
use super::{VfsError, VfsResult};

/// Seekable read/write access to a file's bytes.
pub trait RandomAccessContent: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> RandomAccessContent for T {}

/// Core file handle operations.
pub trait FileHandle: Send + Sync + fmt::Debug {
    // ========================================================================
    // Identity
    // ========================================================================

    /// URI of this handle in its own scheme.
    fn uri(&self) -> String;

    /// Last path segment, decoded.
    fn base_name(&self) -> String;

    // ========================================================================
    // Attributes
    // ========================================================================

    /// What is at this location. `Imaginary` when nothing is.
    fn kind(&self) -> VfsResult<FileKind>;

    /// Kind already known from the listing that produced this handle.
    ///
    /// Never queries the backend; `None` when nothing was recorded.
    fn listed_kind(&self) -> Option<FileKind> {
        None
    }

    /// Check if something exists at this location.
    fn exists(&self) -> VfsResult<bool> {
        Ok(self.kind()?.exists())
    }

    /// Size, modification time and attributes.
    fn content(&self) -> VfsResult<FileContent>;

    /// What the backend can do with this file.
    fn capabilities(&self) -> VfsResult<BTreeSet<Capability>>;

    // ========================================================================
    // Content
    // ========================================================================

    /// Stream the file's bytes.
    fn input_stream(&self) -> VfsResult<Box<dyn Read + Send>>;

    /// Write the file, creating it (and missing parents) if needed.
    ///
    /// Without `append` the file is truncated first.
    fn output_stream(&self, append: bool) -> VfsResult<Box<dyn Write + Send>>;

    /// Seekable access to the file's bytes.
    fn random_access(&self, mode: AccessMode) -> VfsResult<Box<dyn RandomAccessContent>>;

    // ========================================================================
    // Tree
    // ========================================================================

    /// An existing direct child, or `None` if there is no such child.
    fn child(&self, name: &str) -> VfsResult<Option<Arc<dyn FileHandle>>>;

    /// All direct children.
    fn children(&self) -> VfsResult<Vec<Arc<dyn FileHandle>>>;

    /// A handle for a direct child whether or not it exists yet.
    fn resolve_child(&self, name: &str) -> VfsResult<Arc<dyn FileHandle>>;

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Create an empty file (and missing parents). No-op if the file exists.
    fn create_file(&self) -> VfsResult<()>;

    /// Create a folder (and missing parents). No-op if the folder exists.
    fn create_folder(&self) -> VfsResult<()>;

    /// Delete a file or an empty folder. Returns false if nothing was there.
    fn delete(&self) -> VfsResult<bool>;

    /// Delete this location and everything under it. Returns the number of
    /// entries removed.
    fn delete_all(&self) -> VfsResult<u64>;

    /// Replace this location with a copy of `source`.
    fn copy_from(&self, source: &dyn FileHandle, selector: CopySelector) -> VfsResult<()>;

    /// Move this location to `dest`.
    fn move_to(&self, dest: &dyn FileHandle) -> VfsResult<()>;

    /// Drop any cached state about this location.
    fn refresh(&self) -> VfsResult<()>;

    /// Release resources held for this handle.
    fn close(&self) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Read entire file contents.
    fn read_all(&self) -> VfsResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.input_stream()?.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Write entire file contents, replacing what was there.
    fn write_all(&self, data: &[u8]) -> VfsResult<()> {
        let mut out = self.output_stream(false)?;
        out.write_all(data)?;
        out.flush()?;
        Ok(())
    }
}

/// Copy `source` onto `dest` through the generic handle interface.
///
/// Backends that cannot copy natively (or whose peer lives elsewhere) use
/// this. Returns the number of entries written.
pub fn copy_tree(
    source: &dyn FileHandle,
    dest: &dyn FileHandle,
    selector: CopySelector,
) -> VfsResult<u64> {
    match source.kind()? {
        FileKind::Imaginary => Err(VfsError::not_found(source.uri())),
        FileKind::File => {
            let mut reader = source.input_stream()?;
            let mut writer = dest.output_stream(false)?;
            io::copy(&mut reader, &mut writer)?;
            writer.flush()?;
            Ok(1)
        }
        FileKind::Folder => {
            dest.create_folder()?;
            let mut copied = 1;
            if let Some(next) = selector.descend() {
                for child in source.children()? {
                    let target = dest.resolve_child(&child.base_name())?;
                    copied += copy_tree(child.as_ref(), target.as_ref(), next)?;
                }
            }
            Ok(copied)
        }
    }
}

/// Move `source` to `dest` by copying the whole tree and deleting the
/// original.
pub fn move_tree(source: &dyn FileHandle, dest: &dyn FileHandle) -> VfsResult<()> {
    if dest.exists()? {
        return Err(VfsError::already_exists(dest.uri()));
    }
    copy_tree(source, dest, CopySelector::All)?;
    source.delete_all()?;
    Ok(())
}
